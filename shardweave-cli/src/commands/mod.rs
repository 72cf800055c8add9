pub mod inspect;
pub mod recombine;
pub mod split;
