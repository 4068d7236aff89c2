//! Page sequence derived from a page count

use std::fmt;
use std::iter::FusedIterator;
use std::num::NonZeroUsize;

/// 1-based page number, always within `1..=page_count` of the document it
/// was produced for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageIndex(NonZeroUsize);

impl PageIndex {
    /// Returns `None` for zero.
    #[must_use]
    pub fn new(number: usize) -> Option<Self> {
        NonZeroUsize::new(number).map(Self)
    }

    #[must_use]
    pub fn get(self) -> usize {
        self.0.get()
    }

    /// 0-based position, as expected by most rendering engines
    #[must_use]
    pub fn zero_based(self) -> usize {
        self.0.get() - 1
    }
}

impl fmt::Display for PageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Auxiliary layers the renderer may extract alongside the bitmap.
///
/// Both are off by default: pages paint faster, but carry no selectable
/// text and no annotation overlays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RenderOptions {
    pub text_layer: bool,
    pub annotation_layer: bool,
}

/// A single page render request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub index: PageIndex,
    pub options: RenderOptions,
}

/// Ordered page requests for `1..=page_count`.
///
/// Holds no pages itself; every call to [`PageSequence::iter`] starts a
/// fresh pass over the same indices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageSequence {
    page_count: usize,
    options: RenderOptions,
}

impl PageSequence {
    #[must_use]
    pub fn new(page_count: usize) -> Self {
        Self::with_options(page_count, RenderOptions::default())
    }

    #[must_use]
    pub fn with_options(page_count: usize, options: RenderOptions) -> Self {
        Self {
            page_count,
            options,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.page_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.page_count == 0
    }

    #[must_use]
    pub fn options(&self) -> RenderOptions {
        self.options
    }

    #[must_use]
    pub fn iter(&self) -> PageRequests {
        PageRequests {
            next: 1,
            end: self.page_count,
            options: self.options,
        }
    }
}

impl IntoIterator for PageSequence {
    type Item = PageRequest;
    type IntoIter = PageRequests;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &PageSequence {
    type Item = PageRequest;
    type IntoIter = PageRequests;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the requests of a [`PageSequence`]
#[derive(Clone, Debug)]
pub struct PageRequests {
    next: usize,
    end: usize,
    options: RenderOptions,
}

impl Iterator for PageRequests {
    type Item = PageRequest;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.end {
            return None;
        }
        let index = PageIndex::new(self.next)?;
        self.next += 1;
        Some(PageRequest {
            index,
            options: self.options,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.end + 1).saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PageRequests {}

impl FusedIterator for PageRequests {}
