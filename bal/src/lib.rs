//! # bal
//!
//! Modèle de données et format d'échange Base Adresse Locale (BAL CSV).
//!
//! ## Features
//!
//! - Modèle voies / numéros / toponymes / positions
//! - Clé d'interopérabilité (`cle_interop`) : encodage et décodage
//! - Import BAL CSV avec validation ligne à ligne et rapport de rejets
//!
//! ## Usage
//!
//! ```rust,ignore
//! let resultat = bal::import::from_bytes(&octets);
//! if !resultat.is_valid {
//!     anyhow::bail!("fichier BAL inutilisable");
//! }
//! println!("{} voies, {} numéros", resultat.voies.len(), resultat.numeros.len());
//! for rejet in &resultat.rejected {
//!     eprintln!("{rejet}");
//! }
//! ```

pub mod cle_interop;
pub mod error;
pub mod import;
pub mod types;

pub use cle_interop::{format_cle_interop, parse_cle_interop, slugify};
pub use error::{BalError, RejectedRow};
pub use import::ImportResult;
pub use types::{Numero, Position, PositionKind, Toponyme, Voie, NUMERO_TOPONYME};
