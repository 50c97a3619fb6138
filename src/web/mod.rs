//! JSON web service over the analysis pipeline.
//!
//! ## Starting the Server
//!
//! ```text
//! # Start on default port 8080
//! nutri-solver serve
//!
//! # Custom port, custom catalog
//! nutri-solver serve --port 3000 --catalog my_foods.json
//!
//! # Bind to all interfaces
//! nutri-solver serve --address 0.0.0.0
//! ```
//!
//! ## API Endpoints
//!
//! - `GET /health` - Liveness check
//! - `POST /api/analyze?quantity=N&score=true` - Inference response in, record out
//! - `POST /api/scale` - `{record, quantity}` in, scaled record out
//! - `POST /api/score` - `{foodName, nutrition}` in, health score out
//! - `GET /api/match?name=...` - How a name resolves against the catalog
//! - `GET /api/catalog` - Catalog summary
//!
//! Failures return `{error, error_type, details}` with a 4xx status.

pub mod server;
