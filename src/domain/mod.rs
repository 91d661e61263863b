// Domain layer: the wire value model and the procedure port.

pub mod model;
pub mod ports;
