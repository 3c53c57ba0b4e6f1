//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     token cancelled → HttpServer stops accepting → in-flight searches finish → exit
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
