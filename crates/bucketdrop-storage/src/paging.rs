//! Key-ordered pagination shared by the in-process backends.
//!
//! The continuation token is the last key of the previous page; the next page
//! starts at the first key strictly greater than it.

use bucketdrop_core::ContinuationToken;

use crate::traits::{ListOptions, ListResult, ObjectSummary};

pub(crate) fn paginate(mut objects: Vec<ObjectSummary>, options: &ListOptions) -> ListResult {
    objects.sort_by(|a, b| a.key.cmp(&b.key));

    let max_keys = options.max_keys.max(1);
    let mut remaining = objects.into_iter().filter(|object| match &options.continuation_token {
        Some(token) => object.key.as_str() > token.as_str(),
        None => true,
    });

    let results: Vec<ObjectSummary> = remaining.by_ref().take(max_keys).collect();
    let has_more = remaining.next().is_some();

    let next_token = if has_more {
        results
            .last()
            .map(|last| ContinuationToken::new(last.key.clone()))
    } else {
        None
    };

    ListResult {
        results,
        next_token,
    }
}
