// Route handlers, one module per resource. Reads are public; writes run
// behind `middleware::protect` and check role and ownership themselves.
pub mod auth;
pub mod bootcamps;
pub mod courses;
pub mod reviews;

mod utils;
