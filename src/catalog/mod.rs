//! Reference food catalog storage and indexing.
//!
//! The catalog holds two lists of known foods: *completed foods* (whole
//! dishes and packaged products) and *ingredients* (raw components). Both
//! record absolute nutrition for one serving of `unitWeight` grams or
//! millilitres. An embedded catalog is compiled into the binary, but custom
//! catalogs can also be loaded from JSON files (optionally gzip-compressed).
//!
//! ## Example
//!
//! ```rust,no_run
//! use nutri_solver::ReferenceDatabase;
//!
//! let db = ReferenceDatabase::load_embedded().unwrap();
//!
//! for food in &db.completed_foods {
//!     println!("{} ({}g)", food.name, food.unit_weight);
//! }
//!
//! let chicken = db.find_completed_food("닭가슴살");
//! ```
//!
//! ## Custom Catalogs
//!
//! ```rust,no_run
//! use nutri_solver::ReferenceDatabase;
//! use std::path::Path;
//!
//! let db = ReferenceDatabase::load_embedded().unwrap();
//! let json = db.to_json().unwrap();
//!
//! let custom = ReferenceDatabase::load_from_file(Path::new("my_foods.json.gz")).unwrap();
//! ```

pub mod store;
