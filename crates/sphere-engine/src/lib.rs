//! Sphere engine crate.
//!
//! Platform + GPU runtime, plus the pieces that turn a scene file and a
//! shader pair into a lit, indexed draw: mesh loading, shader linking and
//! GPU vertex/uniform state.

pub mod core;
pub mod device;
pub mod logging;
pub mod mesh;
pub mod render;
pub mod shader;
pub mod window;
