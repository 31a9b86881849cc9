// Three security tiers:
// Public (no auth) → Protected (session required) → Elevated (session + admin)

pub mod elevated;
pub mod protected;
pub mod public;
