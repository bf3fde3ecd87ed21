// Savora: cooperating services for a food-ordering platform.
//
// The interesting parts live in two places: `auth` (the signed-token
// lifecycle that lets any service authenticate a request without calling
// back to the issuer) and `kafka` (the at-least-once order event
// hand-off between the order service and its subscribers). The service
// modules are the thin HTTP surfaces wired around them, one binary each
// under src/bin/.

pub mod auth;
pub mod auth_service;
pub mod config;
pub mod error;
pub mod gateway;
pub mod kafka;
pub mod order_service;
pub mod restaurant_service;
