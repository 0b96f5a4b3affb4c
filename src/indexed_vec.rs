//! Type-safe indexing for the dots, edges and cells of a Slitherlink grid.  Each kind of grid
//! element gets its own opaque index type, and its own replacement for [`Vec`] which can only be
//! indexed by that type.  This stops a dot index from ever being used to look up an edge.

use std::{
    fmt::{Debug, Formatter},
    marker::PhantomData,
    ops::{Index, IndexMut},
};

/// A new-type over [`Vec`] which will only accept indices of an opaque index type
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct TypedVec<Idx, T> {
    inner: Vec<T>,
    _phantom_data: PhantomData<Idx>,
}

impl<Idx, T> TypedVec<Idx, T> {
    pub fn repeat(elem: T, len: usize) -> Self
    where
        T: Clone,
    {
        Self {
            inner: vec![elem; len],
            _phantom_data: PhantomData,
        }
    }

    /// Builds a collection of `len` elements by calling `f` with each index in turn
    pub fn from_fn(len: usize, mut f: impl FnMut(Idx) -> T) -> Self
    where
        Idx: IdxType,
    {
        Self {
            inner: (0..len).map(|i| f(Idx::from_idx(i))).collect(),
            _phantom_data: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /* ITER FUNCTIONS */

    pub fn iter(&self) -> std::slice::Iter<T> {
        self.inner.iter()
    }

    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx, &T)>
    where
        Idx: IdxType,
    {
        self.inner
            .iter()
            .enumerate()
            .map(|(i, v)| (Idx::from_idx(i), v))
    }
}

impl<Idx, T: Debug> Debug for TypedVec<Idx, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.inner.iter()).finish()
    }
}

impl<IdxT: IdxType, T> Index<IdxT> for TypedVec<IdxT, T> {
    type Output = T;

    fn index(&self, index: IdxT) -> &Self::Output {
        &self.inner[index.to_idx()]
    }
}

impl<IdxT: IdxType, T> IndexMut<IdxT> for TypedVec<IdxT, T> {
    fn index_mut(&mut self, index: IdxT) -> &mut Self::Output {
        &mut self.inner[index.to_idx()]
    }
}

///////////////////////////
// MACRO/TRAIT MACHINERY //
///////////////////////////

macro_rules! idx_impl {
    ($idx_name: ident, $vec_name: ident, $doc: literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $idx_name {
            idx: usize,
        }

        impl IdxType for $idx_name {
            fn from_idx(idx: usize) -> Self {
                Self { idx }
            }

            fn to_idx(self) -> usize {
                self.idx
            }
        }

        pub type $vec_name<T> = TypedVec<$idx_name, T>;

        impl Debug for $idx_name {
            fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($idx_name), self.idx)
            }
        }
    };
}

idx_impl!(DotIdx, DotVec, "An index into the dots of a grid (`row * size + col`)");
idx_impl!(EdgeIdx, EdgeVec, "An index into the edges of a grid (horizontals first)");
idx_impl!(CellIdx, CellVec, "An index into the cells of a grid (`row * (size - 1) + col`)");

/// A common trait implemented by all custom index types
pub trait IdxType {
    fn from_idx(idx: usize) -> Self;

    fn to_idx(self) -> usize;
}
