// Token lifecycle and request authentication.
//
// `codec` owns the wire format and signature checks, `service` owns
// claim semantics and TTLs, `gate` attaches principals at the request
// boundary, and `extractors` turn them into authorization decisions.

pub mod claims;
pub mod codec;
pub mod extractors;
pub mod gate;
pub mod service;

pub use claims::{Claims, Identity, Principal, Role, RoleSet};
pub use codec::{TokenCodec, TokenError};
pub use extractors::{AdminUser, CurrentUser};
pub use gate::authentication_gate;
pub use service::{AuthError, Clock, RoleSource, SystemClock, TokenPair, TokenService};
