
mod mediator;
mod target;
