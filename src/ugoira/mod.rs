pub mod archive;
pub mod assemble;
pub mod repack;
pub mod scratch;
