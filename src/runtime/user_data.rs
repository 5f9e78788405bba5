//! The live `UserData`: an opaque host object, identified by address,
//! marshaled entirely through the Codec Seam.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// The shared body of a piece of host user data. The core never inspects
/// `payload`; it exists only so a codec (`crate::codec::UserDataCodec`)
/// has something concrete to dump and load.
#[derive(Debug)]
pub struct UserDataData {
    /// A codec-chosen tag identifying the host type `payload` holds.
    pub type_tag: String,
    /// The opaque host payload.
    pub payload: Rc<RefCell<dyn Any>>,
}

/// A piece of host user data.
#[derive(Debug, Clone)]
pub struct UserData(pub Rc<UserDataData>);

impl UserData {
    /// Wraps an arbitrary host value under the given type tag.
    pub fn new(type_tag: impl Into<String>, payload: impl Any) -> Self {
        Self(Rc::new(UserDataData {
            type_tag: type_tag.into(),
            payload: Rc::new(RefCell::new(payload)),
        }))
    }

    /// The stable address used as this userdata's dump identity.
    pub fn address(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for UserData {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
