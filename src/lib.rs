pub mod acquisition;
pub mod configuration;
pub mod ntrip;
pub mod prometheus;
pub mod recording;
pub mod serial;
pub mod time_sync;
pub mod ubx;
pub mod validator;

#[macro_use]
extern crate bitflags;

#[cfg(test)]
#[macro_use]
extern crate assert_approx_eq;
