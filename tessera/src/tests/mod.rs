//! End-to-end tests across matching, estimation and rendering.

mod ffi_boundary;
mod helpers;
