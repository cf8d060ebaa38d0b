mod asynchronous;
mod hooks;
mod support;
mod timeouts;
