//! Singly linked ordered sequence used throughout the dump model.
//!
//! Ordered collections in the model (threads in a dump, frames in a thread)
//! are held in this container. It preserves insertion order unless elements
//! are placed with [`insert_sorted_by`](List::insert_sorted_by). Length is
//! cached; append walks the chain, so bulk construction should go through
//! `FromIterator` or `Extend`, which keep a tail cursor while building.

use std::cmp::Ordering;
use std::fmt;

/// A singly linked sequence with a cached length.
pub struct List<T> {
    head: Option<Box<Node<T>>>,
    len: usize,
}

struct Node<T> {
    elem: T,
    next: Option<Box<Node<T>>>,
}

impl<T> List<T> {
    /// Create an empty list.
    pub fn new() -> Self {
        List { head: None, len: 0 }
    }

    /// Create a list holding a single element.
    pub fn of(elem: T) -> Self {
        let mut list = List::new();
        list.push_back(elem);
        list
    }

    /// Number of elements in the list.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the list holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// First element, if any.
    pub fn front(&self) -> Option<&T> {
        self.head.as_ref().map(|node| &node.elem)
    }

    /// Append an element at the tail.
    pub fn push_back(&mut self, elem: T) {
        let mut cursor = &mut self.head;
        while let Some(node) = cursor {
            cursor = &mut node.next;
        }
        *cursor = Some(Box::new(Node { elem, next: None }));
        self.len += 1;
    }

    /// Remove and return the first element.
    pub fn pop_front(&mut self) -> Option<T> {
        let node = self.head.take()?;
        self.head = node.next;
        self.len -= 1;
        Some(node.elem)
    }

    /// Element at `index`, if in bounds.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.iter().nth(index)
    }

    /// Mutable element at `index`, if in bounds.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.iter_mut().nth(index)
    }

    /// First element matching the predicate.
    pub fn find<P>(&self, mut pred: P) -> Option<&T>
    where
        P: FnMut(&T) -> bool,
    {
        self.iter().find(|&elem| pred(elem))
    }

    /// Index of the first element matching the predicate.
    pub fn position<P>(&self, pred: P) -> Option<usize>
    where
        P: FnMut(&T) -> bool,
    {
        self.iter().position(pred)
    }

    /// Insert `elem` at `index`, shifting later elements back.
    ///
    /// An `index` at or past the end appends.
    pub fn insert(&mut self, index: usize, elem: T) {
        let mut cursor = &mut self.head;
        for _ in 0..index {
            match cursor {
                Some(node) => cursor = &mut node.next,
                None => break,
            }
        }
        let next = cursor.take();
        *cursor = Some(Box::new(Node { elem, next }));
        self.len += 1;
    }

    /// Insert `elem` before the first element ordered after it.
    ///
    /// The comparator receives `(new, existing)`. An element comparing equal
    /// to existing ones is placed after them, so insertion is stable. An
    /// empty list receives the element as its only node.
    pub fn insert_sorted_by<F>(&mut self, elem: T, mut cmp: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let index = self
            .iter()
            .position(|existing| cmp(&elem, existing) == Ordering::Less)
            .unwrap_or(self.len);
        self.insert(index, elem);
    }

    /// Remove and return the element at `index`, if in bounds.
    ///
    /// The elements before and after it keep their relative order.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        let mut cursor = &mut self.head;
        for _ in 0..index {
            match cursor {
                Some(node) => cursor = &mut node.next,
                None => return None,
            }
        }
        let node = cursor.take()?;
        *cursor = node.next;
        self.len -= 1;
        Some(node.elem)
    }

    /// Borrowing iterator over the elements in order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            next: self.head.as_deref(),
        }
    }

    /// Mutably borrowing iterator over the elements in order.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            next: self.head.as_deref_mut(),
        }
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        List::new()
    }
}

// Node chains are unwound iteratively; the default recursive drop would
// overflow the stack on long lists.
impl<T> Drop for List<T> {
    fn drop(&mut self) {
        let mut next = self.head.take();
        while let Some(mut node) = next {
            next = node.next.take();
        }
    }
}

impl<T: Clone> Clone for List<T> {
    fn clone(&self) -> Self {
        self.iter().cloned().collect()
    }
}

impl<T: fmt::Debug> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for List<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Eq> Eq for List<T> {}

impl<T> Extend<T> for List<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let mut cursor = &mut self.head;
        while let Some(node) = cursor {
            cursor = &mut node.next;
        }
        for elem in iter {
            *cursor = Some(Box::new(Node { elem, next: None }));
            self.len += 1;
            if let Some(node) = cursor {
                cursor = &mut node.next;
            }
        }
    }
}

impl<T> FromIterator<T> for List<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = List::new();
        list.extend(iter);
        list
    }
}

/// Borrowing iterator returned by [`List::iter`].
pub struct Iter<'a, T> {
    next: Option<&'a Node<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.next.map(|node| {
            self.next = node.next.as_deref();
            &node.elem
        })
    }
}

/// Mutably borrowing iterator returned by [`List::iter_mut`].
pub struct IterMut<'a, T> {
    next: Option<&'a mut Node<T>>,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        self.next.take().map(|node| {
            self.next = node.next.as_deref_mut();
            &mut node.elem
        })
    }
}

/// Owning iterator returned by [`List::into_iter`].
pub struct IntoIter<T>(List<T>);

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.0.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.0.len, Some(self.0.len))
    }
}

impl<T> IntoIterator for List<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter(self)
    }
}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut List<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}
