/// Correspondence tracking rules shared by the client and the dashboard.
///
/// - Status parsing and badge colors
/// - Deadline (plazo) evaluation against today's date
/// - Pagination math and pager windows
/// - Traceability threads built from `cartaAnterior` links
/// - Form parsing and validation for every input payload

pub mod estado;
pub mod pagination;
pub mod plazo;
pub mod trazabilidad;
pub mod validation;

pub use estado::Estado;
pub use pagination::{PageWindow, clamp_page, matches_search, paginate, total_pages};
pub use plazo::{Plazo, comparar_fechas, fecha_local, hoy};
pub use trazabilidad::Trazabilidad;
pub use validation::{FieldErrors, FormData, FromForm, Modo, Validate};
