//! Cursors and cursor combinators.
//!
//! A `Cursor` is the iteration primitive backends and scanners exchange:
//! `next` yields `Ok(Some(item))`, signals clean exhaustion with `Ok(None)`,
//! and reports failures with `Err(_)` - exhaustion and failure are never
//! conflated, and a successful step never disturbs previously observed
//! errors. Resources (remote cursors, buffers) are released on drop.
//!
//! Combinators:
//! - [`ArrayCursor`] / [`SliceCursor`] iterate a contiguous region,
//! - [`chunkify`] splits one cursor into consecutive fixed-size chunks,
//! - [`tee`] duplicates one cursor into two independent consumers.
//!
//! Everything here is single-threaded: combinators share state through
//! `Rc<RefCell<_>>` and each cursor handle has a single consumer.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::{Error, Result};

/// A fallible, possibly remote-backed iterator.
pub trait Cursor {
    type Item;

    /// Advance the cursor.
    ///
    /// Returns `Ok(Some(item))` on success, `Ok(None)` once the stream is
    /// exhausted (calling again keeps returning `Ok(None)`), and `Err(_)` on
    /// failure. A failed step does not consume an element.
    fn next(&mut self) -> Result<Option<Self::Item>>;

    /// Drain the cursor into a vector. Mostly useful in tests.
    fn collect_remaining(&mut self) -> Result<Vec<Self::Item>>
    where
        Self: Sized,
    {
        let mut items: Vec<Self::Item> = Vec::new();
        while let Some(item) = self.next()? {
            items.push(item);
        }
        Ok(items)
    }
}

impl<C: Cursor + ?Sized> Cursor for Box<C> {
    type Item = C::Item;

    fn next(&mut self) -> Result<Option<Self::Item>> {
        (**self).next()
    }
}

impl<C: Cursor + ?Sized> Cursor for &mut C {
    type Item = C::Item;

    fn next(&mut self) -> Result<Option<Self::Item>> {
        (**self).next()
    }
}

/// An owning cursor over a vector; elements are moved out one at a time.
pub struct ArrayCursor<T> {
    items: std::vec::IntoIter<T>,
}

impl<T> ArrayCursor<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into_iter(),
        }
    }
}

impl<T> Cursor for ArrayCursor<T> {
    type Item = T;

    fn next(&mut self) -> Result<Option<T>> {
        Ok(self.items.next())
    }
}

/// A borrowing cursor over a slice; the slice keeps owning its elements.
pub struct SliceCursor<'a, T> {
    items: std::slice::Iter<'a, T>,
}

impl<'a, T> SliceCursor<'a, T> {
    pub fn new(items: &'a [T]) -> Self {
        Self {
            items: items.iter(),
        }
    }
}

impl<'a, T> Cursor for SliceCursor<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Result<Option<&'a T>> {
        Ok(self.items.next())
    }
}

/*
 * chunkify
 */

/// Split `cursor` into consecutive chunks of at most `chunk` elements.
///
/// The returned outer cursor yields [`Chunk`] cursors. All chunks share the
/// underlying cursor: elements are consumed from it only as chunk cursors
/// advance, and advancing the outer cursor consumes exactly one element (it
/// becomes the head of the new chunk) - so abandoning a chunk early skips
/// the rest of that chunk.
///
/// Exhausting the chunks one after the other yields every element of
/// `cursor` exactly once, in order.
///
/// # Errors
/// `chunk == 0` is `invalid-input`.
pub fn chunkify<C: Cursor>(cursor: C, chunk: usize) -> Result<Chunkify<C>> {
    if chunk == 0 {
        return Err(Error::invalid_input("chunk size must be positive"));
    }
    Ok(Chunkify {
        source: Rc::new(RefCell::new(cursor)),
        chunk,
    })
}

/// The outer cursor returned by [`chunkify`].
pub struct Chunkify<C: Cursor> {
    source: Rc<RefCell<C>>,
    chunk: usize,
}

impl<C: Cursor> Cursor for Chunkify<C> {
    type Item = Chunk<C>;

    fn next(&mut self) -> Result<Option<Chunk<C>>> {
        let head: Option<C::Item> = self.source.borrow_mut().next()?;
        Ok(head.map(|head| Chunk {
            source: Rc::clone(&self.source),
            head: Some(head),
            budget: self.chunk - 1,
        }))
    }
}

/// One chunk of the underlying stream; yields at most `chunk` elements.
pub struct Chunk<C: Cursor> {
    source: Rc<RefCell<C>>,
    head: Option<C::Item>,
    budget: usize,
}

impl<C: Cursor> Cursor for Chunk<C> {
    type Item = C::Item;

    fn next(&mut self) -> Result<Option<C::Item>> {
        if let Some(head) = self.head.take() {
            return Ok(Some(head));
        }
        if self.budget == 0 {
            return Ok(None);
        }

        match self.source.borrow_mut().next()? {
            Some(item) => {
                self.budget -= 1;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }
}

/*
 * tee
 */

/// Queue capacity used by [`tee`]: how far ahead one sibling may run before
/// buffering fails and the deferred-share machinery kicks in.
pub const DEFAULT_TEE_CAPACITY: usize = 512;

struct TeeSide<T> {
    alive: bool,
    /// Elements this side has yet to observe, oldest first.
    queue: VecDeque<T>,
    /// Element this side pulled from the source but could not buffer for its
    /// sibling. It has not been delivered to either consumer yet.
    unshared: Option<T>,
    /// Element this side pulled whose share has since completed; delivered
    /// on this side's next call.
    undelivered: Option<T>,
}

impl<T> TeeSide<T> {
    fn new() -> Self {
        Self {
            alive: true,
            queue: VecDeque::new(),
            unshared: None,
            undelivered: None,
        }
    }
}

struct TeeShared<C: Cursor> {
    source: C,
    capacity: usize,
    sides: [TeeSide<C::Item>; 2],
}

/// One of the two sibling cursors produced by [`tee`].
pub struct Tee<C: Cursor> {
    shared: Rc<RefCell<TeeShared<C>>>,
    side: usize,
}

/// Duplicate `cursor` into two sibling cursors that each observe the full
/// stream, in order, regardless of how their consumers interleave.
///
/// Whichever sibling runs ahead buffers the elements it observed in the
/// other sibling's queue. The queue is bounded by
/// [`DEFAULT_TEE_CAPACITY`]; when it is full the element is parked and the
/// producing call fails with `out-of-memory` - the next call on either
/// sibling retries the share, so the stream resumes as soon as the lagging
/// consumer catches up. At most one element per sibling is parked this way.
///
/// Dropping one sibling unlinks it (no more buffering on its behalf);
/// dropping the last one drops the source and the buffers.
pub fn tee<C>(cursor: C) -> Result<(Tee<C>, Tee<C>)>
where
    C: Cursor,
    C::Item: Clone,
{
    tee_with_capacity(cursor, DEFAULT_TEE_CAPACITY)
}

/// [`tee`] with an explicit queue capacity.
///
/// # Errors
/// `capacity == 0` is `invalid-input`.
pub fn tee_with_capacity<C>(cursor: C, capacity: usize) -> Result<(Tee<C>, Tee<C>)>
where
    C: Cursor,
    C::Item: Clone,
{
    if capacity == 0 {
        return Err(Error::invalid_input("tee queue capacity must be positive"));
    }

    let shared = Rc::new(RefCell::new(TeeShared {
        source: cursor,
        capacity,
        sides: [TeeSide::new(), TeeSide::new()],
    }));

    Ok((
        Tee {
            shared: Rc::clone(&shared),
            side: 0,
        },
        Tee { shared, side: 1 },
    ))
}

impl<C> Cursor for Tee<C>
where
    C: Cursor,
    C::Item: Clone,
{
    type Item = C::Item;

    fn next(&mut self) -> Result<Option<C::Item>> {
        let mut shared = self.shared.borrow_mut();
        let me: usize = self.side;
        let other: usize = 1 - me;

        // An element whose share completed while we were parked predates
        // anything buffered in our queue since; deliver it first.
        if let Some(item) = shared.sides[me].undelivered.take() {
            return Ok(Some(item));
        }

        // Then the elements the sibling buffered for us.
        if let Some(item) = shared.sides[me].queue.pop_front() {
            return Ok(Some(item));
        }

        // Retry our own failed share before producing anything new.
        if let Some(parked) = shared.sides[me].unshared.take() {
            if shared.sides[other].alive {
                if shared.sides[other].queue.len() >= shared.capacity {
                    shared.sides[me].unshared = Some(parked);
                    return Err(Error::OutOfMemory);
                }
                shared.sides[other].queue.push_back(parked.clone());
            }
            return Ok(Some(parked));
        }

        // The sibling may be stuck on a failed share of its own; our queue is
        // empty, so its parked element is exactly our next one.
        if let Some(item) = shared.sides[other].unshared.take() {
            shared.sides[other].undelivered = Some(item.clone());
            return Ok(Some(item));
        }

        let Some(item) = shared.source.next()? else {
            return Ok(None);
        };

        if shared.sides[other].alive {
            if shared.sides[other].queue.len() < shared.capacity {
                shared.sides[other].queue.push_back(item.clone());
            } else {
                shared.sides[me].unshared = Some(item);
                return Err(Error::OutOfMemory);
            }
        }

        Ok(Some(item))
    }
}

impl<C: Cursor> Drop for Tee<C> {
    fn drop(&mut self) {
        let mut shared = self.shared.borrow_mut();
        let me: usize = self.side;
        let other: usize = 1 - me;

        // An element we pulled but never delivered still belongs to the
        // sibling's stream; hand it over. The capacity bound is for live
        // flow control, not for this final push.
        if let Some(item) = shared.sides[me].unshared.take() {
            if shared.sides[other].alive {
                shared.sides[other].queue.push_back(item);
            }
        }

        shared.sides[me].alive = false;
        shared.sides[me].queue.clear();
        shared.sides[me].undelivered = None;
    }
}
