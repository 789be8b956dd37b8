//! 发布页解析：字节游标、区段定位、记录提取与流程编排。

pub mod cursor;
pub mod extractor;
pub mod models;
pub mod pipeline;
pub mod section;
