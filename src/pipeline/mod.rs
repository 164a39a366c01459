pub mod ed_visit;
