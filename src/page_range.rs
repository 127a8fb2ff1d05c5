use crate::error::{Error, RangeBound, Result};
use anyhow::anyhow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRef {
    Number(u32),
    End,
}

/// An inclusive, 1-based page range as typed by a user, e.g. "3-5",
/// "7" or "4-end". Unresolved until the page count is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSpan {
    pub start: PageRef,
    pub end: PageRef,
}

impl PageSpan {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow!("Empty page range"));
        }

        match s.find('-') {
            // "-5" is not a range
            Some(0) => Err(anyhow!("Invalid page range: {}", s)),
            Some(dash_pos) => Ok(PageSpan {
                start: parse_page_ref(&s[..dash_pos])?,
                end: parse_page_ref(&s[dash_pos + 1..])?,
            }),
            None => {
                let page = parse_page_ref(s)?;
                Ok(PageSpan {
                    start: page.clone(),
                    end: page,
                })
            }
        }
    }

    /// Resolve against `total_pages` into a checked `(start, end)` pair.
    pub fn resolve(&self, total_pages: u32) -> Result<(u32, u32)> {
        let resolve = |r: &PageRef| match r {
            PageRef::Number(n) => *n,
            PageRef::End => total_pages,
        };
        let (start, end) = (resolve(&self.start), resolve(&self.end));
        check_bounds(start, end, total_pages)?;
        Ok((start, end))
    }
}

/// Require `1 <= start <= end <= page_count`.
pub fn check_bounds(start: u32, end: u32, page_count: u32) -> Result<()> {
    let bound = if start < 1 {
        RangeBound::StartBelowOne
    } else if start > end {
        RangeBound::StartAfterEnd
    } else if end > page_count {
        RangeBound::EndBeyondCount
    } else {
        return Ok(());
    };
    Err(Error::Range {
        start,
        end,
        page_count,
        bound,
    })
}

fn parse_page_ref(s: &str) -> anyhow::Result<PageRef> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("end") {
        Ok(PageRef::End)
    } else {
        s.parse::<u32>()
            .map(PageRef::Number)
            .map_err(|_| anyhow!("Invalid page number: {}", s))
    }
}
