// Image retrieval abstraction — pluggable providers behind the ImageSource trait.

pub mod bing_source;
pub mod traits;
