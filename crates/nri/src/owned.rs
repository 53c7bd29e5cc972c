use std::ops::Deref;

/// Either owns `O`, which is destroyed with this value, or merely refers to a `B` owned elsewhere, like the images
/// of a swapchain.
#[derive(Debug)]
pub enum OwnedOrBorrowed<O, B> {
	Owned(O),
	Borrowed(B),
}

impl<O, B> OwnedOrBorrowed<O, B>
where
	O: Deref<Target = B>,
	B: Copy,
{
	/// The underlying value, regardless of who owns it.
	pub fn get(&self) -> B {
		match self {
			OwnedOrBorrowed::Owned(owned) => **owned,
			OwnedOrBorrowed::Borrowed(borrowed) => *borrowed,
		}
	}

	pub fn is_owned(&self) -> bool {
		matches!(self, OwnedOrBorrowed::Owned(_))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::cell::Cell;
	use std::rc::Rc;

	struct Guard {
		value: u64,
		dropped: Rc<Cell<bool>>,
	}

	impl Deref for Guard {
		type Target = u64;

		fn deref(&self) -> &Self::Target {
			&self.value
		}
	}

	impl Drop for Guard {
		fn drop(&mut self) {
			self.dropped.set(true);
		}
	}

	#[test]
	fn test_accessor_and_release() {
		let dropped = Rc::new(Cell::new(false));
		let owned = OwnedOrBorrowed::<Guard, u64>::Owned(Guard {
			value: 42,
			dropped: dropped.clone(),
		});
		let borrowed = OwnedOrBorrowed::<Guard, u64>::Borrowed(42);
		assert_eq!(owned.get(), borrowed.get());
		assert!(owned.is_owned() && !borrowed.is_owned());

		drop(borrowed);
		assert!(!dropped.get());
		drop(owned);
		assert!(dropped.get());
	}
}
