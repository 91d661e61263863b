// Application layer: the procedures this server exposes.

pub mod procedures;
