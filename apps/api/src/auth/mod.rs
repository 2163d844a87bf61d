// Authentication
// Operators authenticate with bearer JWTs issued by the federation portal

pub mod jwt;
