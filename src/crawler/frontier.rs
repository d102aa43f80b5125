//! The crawl frontier
//!
//! Two ordering policies share one interface:
//! - [`FrontierPolicy::Tiered`]: insertion position encodes priority. Category
//!   items go to the absolute front, product items right after the run of
//!   category items, normal items at the back. Every insert is O(1).
//! - [`FrontierPolicy::Sorted`]: items pop in (tier rank, URL) order, which is
//!   the order a full re-sort before every dequeue would produce.

use crate::url::ClassificationTag;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use url::Url;

/// A URL waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierItem {
    pub url: Url,
    /// BFS depth from the seeds
    pub depth: u32,
    pub tag: ClassificationTag,
    /// Category a product item is counted against for quotas
    pub origin_category: Option<String>,
}

impl FrontierItem {
    pub fn new(url: Url, depth: u32, tag: ClassificationTag) -> Self {
        Self {
            url,
            depth,
            tag,
            origin_category: None,
        }
    }

    pub fn with_origin(mut self, origin_category: Option<String>) -> Self {
        self.origin_category = origin_category;
        self
    }
}

/// Ordering policy of a [`Frontier`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontierPolicy {
    Tiered,
    Sorted,
}

/// Heap entry ordered so the smallest (rank, URL) pops first
#[derive(Debug, Clone)]
struct SortedItem(FrontierItem);

impl Ord for SortedItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap
        other
            .0
            .tag
            .rank()
            .cmp(&self.0.tag.rank())
            .then_with(|| other.0.url.as_str().cmp(self.0.url.as_str()))
    }
}

impl PartialOrd for SortedItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortedItem {
    fn eq(&self, other: &Self) -> bool {
        self.0.tag == other.0.tag && self.0.url == other.0.url
    }
}

impl Eq for SortedItem {}

#[derive(Debug)]
enum Queue {
    Tiered {
        categories: VecDeque<FrontierItem>,
        products: VecDeque<FrontierItem>,
        normals: VecDeque<FrontierItem>,
    },
    Sorted(BinaryHeap<SortedItem>),
}

/// Queue of URLs to crawl
#[derive(Debug)]
pub struct Frontier {
    queue: Queue,
}

impl Frontier {
    pub fn new(policy: FrontierPolicy) -> Self {
        let queue = match policy {
            FrontierPolicy::Tiered => Queue::Tiered {
                categories: VecDeque::new(),
                products: VecDeque::new(),
                normals: VecDeque::new(),
            },
            FrontierPolicy::Sorted => Queue::Sorted(BinaryHeap::new()),
        };
        Self { queue }
    }

    /// Rebuilds a frontier whose [`snapshot`](Self::snapshot) was `items`
    ///
    /// Items are placed without re-applying the insertion rules, so a tiered
    /// frontier pops in exactly the given order.
    pub fn from_ordered(policy: FrontierPolicy, items: Vec<FrontierItem>) -> Self {
        let mut frontier = Self::new(policy);
        match &mut frontier.queue {
            Queue::Tiered {
                categories,
                products,
                normals,
            } => {
                for item in items {
                    match item.tag {
                        ClassificationTag::Category => categories.push_back(item),
                        ClassificationTag::Product => products.push_back(item),
                        ClassificationTag::Normal => normals.push_back(item),
                    }
                }
            }
            Queue::Sorted(heap) => heap.extend(items.into_iter().map(SortedItem)),
        }
        frontier
    }

    pub fn policy(&self) -> FrontierPolicy {
        match self.queue {
            Queue::Tiered { .. } => FrontierPolicy::Tiered,
            Queue::Sorted(_) => FrontierPolicy::Sorted,
        }
    }

    /// Inserts an item at the position its tag dictates
    pub fn push(&mut self, item: FrontierItem) {
        match &mut self.queue {
            Queue::Tiered {
                categories,
                products,
                normals,
            } => match item.tag {
                ClassificationTag::Category => categories.push_front(item),
                ClassificationTag::Product => products.push_front(item),
                ClassificationTag::Normal => normals.push_back(item),
            },
            Queue::Sorted(heap) => heap.push(SortedItem(item)),
        }
    }

    /// Removes the highest-priority item
    pub fn pop(&mut self) -> Option<FrontierItem> {
        match &mut self.queue {
            Queue::Tiered {
                categories,
                products,
                normals,
            } => categories
                .pop_front()
                .or_else(|| products.pop_front())
                .or_else(|| normals.pop_front()),
            Queue::Sorted(heap) => heap.pop().map(|entry| entry.0),
        }
    }

    pub fn len(&self) -> usize {
        match &self.queue {
            Queue::Tiered {
                categories,
                products,
                normals,
            } => categories.len() + products.len() + normals.len(),
            Queue::Sorted(heap) => heap.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All queued items in the order they would pop
    pub fn snapshot(&self) -> Vec<FrontierItem> {
        match &self.queue {
            Queue::Tiered {
                categories,
                products,
                normals,
            } => categories
                .iter()
                .chain(products.iter())
                .chain(normals.iter())
                .cloned()
                .collect(),
            Queue::Sorted(heap) => {
                let mut entries: Vec<SortedItem> = heap.iter().cloned().collect();
                // Ascending on the reversed Ord puts the next pop last
                entries.sort();
                entries.into_iter().rev().map(|entry| entry.0).collect()
            }
        }
    }
}
