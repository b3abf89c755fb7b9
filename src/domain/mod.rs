// Domain layer: menu model and ports (provider, clock, storage, callbacks).

pub mod model;
pub mod ports;
