pub(crate) mod bucket_name;
pub(crate) mod encode;
pub(crate) mod headers;
pub(crate) mod md5;
pub(crate) mod url;
pub(crate) mod xml;
