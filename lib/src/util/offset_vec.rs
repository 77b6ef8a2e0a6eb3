use std::fmt::{Debug, Error, Formatter};
use std::iter::{Enumerate, FromIterator};
use std::result::Result;
use std::slice::Iter;

/// Elements with a width (eg. when used in an `OffsetVec`)
pub trait Width {
    fn width(&self) -> usize;
}

/// A vector of elements of different logical "widths", where offsets into the vector are given in
/// terms of the sum of the widths of the previous elements (as opposed to the number of preceding
/// elements).
///
/// The constant pool is the motivating example: it starts at offset 1 and most entries have width
/// 1, but `Long` and `Double` entries take up two offsets. Replacing an entry is only allowed when
/// the width stays the same, so offsets handed out before a replacement stay valid after it.
#[derive(Clone)]
pub struct OffsetVec<T: Sized> {
    /// Entries, along with their offset
    entries: Vec<(Offset, T)>,

    /// Offset of the next element to be added
    offset_len: Offset,
}

/// Offset into an `OffsetVec`
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Offset(pub usize);

impl<T: Sized + Width> OffsetVec<T> {
    /// New empty offset vector
    pub fn new() -> OffsetVec<T> {
        OffsetVec::new_starting_at(Offset(0))
    }

    /// New empty offset vector, with a custom starting offset
    pub fn new_starting_at(initial_offset: Offset) -> OffsetVec<T> {
        OffsetVec {
            entries: vec![],
            offset_len: initial_offset,
        }
    }

    /// Length of the `OffsetVec` (aka. number of entries)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current offset size of the `OffsetVec` (aka. offset of the next element
    /// to be added)
    pub fn offset_len(&self) -> Offset {
        self.offset_len
    }

    /// Add an entry to the back
    pub fn push(&mut self, slot: T) -> Offset {
        let offset = self.offset_len;
        self.offset_len.0 += slot.width();
        self.entries.push((offset, slot));

        offset
    }

    /// Get an entry (and its index) by its offset in the vector
    ///
    /// Note: this uses binary search to find the offset
    pub fn get_offset(&self, offset: Offset) -> OffsetResult<T> {
        match self.entries.binary_search_by_key(&offset, |(off, _)| *off) {
            Err(insert_at) if insert_at == self.entries.len() => OffsetResult::TooLarge,
            Err(insert_at) => OffsetResult::InvalidOffset(insert_at),
            Ok(found_idx) => OffsetResult::Ok(found_idx, &self.entries[found_idx].1),
        }
    }

    /// Replace an existing entry by its offset in the vector, returning the previous value
    ///
    /// The new value must have the same width as the one it replaces. Unlike `push`, this never
    /// grows the vector.
    pub fn set_offset(&mut self, offset: Offset, value: T) -> OffsetResult<'_, T> {
        match self.entries.binary_search_by_key(&offset, |(off, _)| *off) {
            Err(insert_at) if insert_at == self.entries.len() => OffsetResult::TooLarge,
            Err(insert_at) => OffsetResult::InvalidOffset(insert_at),
            Ok(found_idx) => {
                let replacing = &mut self.entries[found_idx].1;
                if replacing.width() != value.width() {
                    OffsetResult::IncompatibleWidth(value.width(), replacing.width())
                } else {
                    OffsetResult::Replaced(found_idx, std::mem::replace(replacing, value))
                }
            }
        }
    }

    pub fn iter(&self) -> OffsetVecIter<'_, T> {
        self.into_iter()
    }
}

impl<A: PartialEq> PartialEq for OffsetVec<A> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<A: Width> Default for OffsetVec<A> {
    fn default() -> Self {
        OffsetVec::new()
    }
}

pub enum OffsetResult<'a, T> {
    /// Element was accessed
    Ok(usize, &'a T),

    /// Element at this index was replaced, and this was its previous value
    Replaced(usize, T),

    /// Offset was invalid, and falls in the middle of the element at this index
    InvalidOffset(usize),

    /// Width is incompatible (only occurs when trying to set an element)
    IncompatibleWidth(usize, usize),

    /// Offset is too big
    TooLarge,
}

impl<'a, T> OffsetResult<'a, T> {
    /// Convert to an `Option` and keep only the value found
    pub fn ok(&self) -> Option<&'a T> {
        match self {
            OffsetResult::Ok(_, found) => Some(*found),
            OffsetResult::Replaced(_, _)
            | OffsetResult::InvalidOffset(_)
            | OffsetResult::TooLarge
            | OffsetResult::IncompatibleWidth(_, _) => None,
        }
    }
}

/// Iterator for borrowed `OffsetVec`
pub struct OffsetVecIter<'a, T>(Enumerate<Iter<'a, (Offset, T)>>);

impl<'a, T> Iterator for OffsetVecIter<'a, T> {
    type Item = (Offset, usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(idx, (off, elem))| (*off, idx, elem))
    }
}

impl<'a, T> IntoIterator for &'a OffsetVec<T> {
    type Item = (Offset, usize, &'a T);
    type IntoIter = OffsetVecIter<'a, T>;

    fn into_iter(self) -> OffsetVecIter<'a, T> {
        OffsetVecIter(self.entries.iter().enumerate())
    }
}

impl<T: Width> FromIterator<T> for OffsetVec<T> {
    fn from_iter<A: IntoIterator<Item = T>>(elems: A) -> Self {
        let mut offset_vec = OffsetVec::new();
        for elem in elems {
            offset_vec.push(elem);
        }
        offset_vec
    }
}

impl<T: Debug> Debug for OffsetVec<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let mut list = f.debug_list();
        for (off, elem) in &self.entries {
            list.entry(&format_args!("#{} = {:?}", off.0, elem));
        }
        list.finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Copy, Clone, Eq, PartialEq, Debug)]
    enum Slot {
        OneWide(u8),
        TwoWide(u8),
    }

    impl Width for Slot {
        fn width(&self) -> usize {
            match self {
                Slot::OneWide(_) => 1,
                Slot::TwoWide(_) => 2,
            }
        }
    }

    fn pool_like() -> OffsetVec<Slot> {
        let mut slots = OffsetVec::new_starting_at(Offset(1));
        slots.push(Slot::OneWide(1));
        slots.push(Slot::TwoWide(2));
        slots.push(Slot::OneWide(3));
        slots
    }

    #[test]
    fn offsets_skip_wide_slots() {
        let slots = pool_like();
        assert_eq!(
            slots.iter().map(|(off, idx, slot)| (off, idx, *slot)).collect::<Vec<_>>(),
            vec![
                (Offset(1), 0, Slot::OneWide(1)),
                (Offset(2), 1, Slot::TwoWide(2)),
                (Offset(4), 2, Slot::OneWide(3)),
            ]
        );
        assert_eq!(slots.offset_len(), Offset(5));
        assert!(matches!(slots.get_offset(Offset(3)), OffsetResult::InvalidOffset(2)));
        assert!(matches!(slots.get_offset(Offset(5)), OffsetResult::TooLarge));
        assert_eq!(slots.get_offset(Offset(4)).ok(), Some(&Slot::OneWide(3)));
    }

    #[test]
    fn replacing_keeps_offsets() {
        let mut slots = pool_like();
        assert!(matches!(
            slots.set_offset(Offset(4), Slot::OneWide(9)),
            OffsetResult::Replaced(2, Slot::OneWide(3))
        ));
        assert!(matches!(
            slots.set_offset(Offset(1), Slot::TwoWide(9)),
            OffsetResult::IncompatibleWidth(2, 1)
        ));
        assert!(matches!(
            slots.set_offset(Offset(5), Slot::OneWide(9)),
            OffsetResult::TooLarge
        ));
        assert_eq!(slots.len(), 3);
        assert_eq!(slots.offset_len(), Offset(5));
        assert_eq!(slots.get_offset(Offset(4)).ok(), Some(&Slot::OneWide(9)));
    }

    #[test]
    fn collecting_starts_at_zero() {
        let slots: OffsetVec<Slot> = vec![Slot::TwoWide(1), Slot::OneWide(2)]
            .into_iter()
            .collect();
        assert_eq!(slots.offset_len(), Offset(3));
        assert_eq!(slots.get_offset(Offset(2)).ok(), Some(&Slot::OneWide(2)));
    }
}
