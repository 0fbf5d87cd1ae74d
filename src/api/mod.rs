/**
* filename : mod
* author : HAMA
* date: 2025. 6. 2.
* description: 
**/

pub mod admin;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod websocket;

pub use routes::create_api_router;
