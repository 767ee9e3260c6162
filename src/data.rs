use crate::{
    data::{page::PageRequest, student::Student},
    error::ClassboardResult,
};
use std::future::Future;

pub mod list_query;
#[cfg(test)]
pub mod memory;
pub mod page;
pub mod student;

///somewhere students can be read from
///
///implementations must produce the slice and the count from one consistent view of the data, so
///that `total_items` always agrees with what the pages actually contain
pub trait StudentStore: Send + Sync {
    ///the requested slice (ordered by id), and how many students match the filter overall
    fn find_page(
        &self,
        request: &PageRequest,
    ) -> impl Future<Output = ClassboardResult<(Vec<Student>, u64)>> + Send;
}
