//! The Fix-Up pass: re-seats call-frame aliases onto their canonical
//! in-array object after a Thread's stack and current frame are loaded.
//!
//! `crate::loader` loads every Call Frame twice: once as a free-standing
//! object reached through a `parent`/`current_frame` handle, and again,
//! by value, as a Call-Frame Stack array element. This mirrors the
//! interpreter this schema was distilled from, which stores its frames
//! by value in the stack array but reaches them everywhere else through
//! pointer fields that, depending on how they were populated, can end up
//! aliasing a copy rather than the array slot itself. Left alone, the
//! standalone copies this crate's loader builds would diverge from the
//! frames actually owned by the stack the moment either was mutated.
//! This pass rewrites every such reference, for one Thread at a time, to
//! point at the in-array frame instead.

use std::collections::HashMap;

use crate::runtime as rt;

/// Rewrites `current_frame` and every frame's `parent` across `stack`'s
/// array to their canonical in-array frame, using the address-keyed map
/// `crate::loader` built while filling that same stack.
///
/// A reference with no entry in `canonical` points at a frame that was
/// never pushed onto this stack (e.g. it belongs to another Thread) and
/// is left as-is, except for `parent`, where this is logged: a frame
/// reachable only through another frame's `parent` edge should always
/// have been on some stack.
pub(crate) fn reseat(
    canonical: &HashMap<usize, rt::Frame>,
    current_frame: &mut Option<rt::Frame>,
    stack: &rt::CallFrameStack,
) {
    if let Some(frame) = current_frame {
        if let Some(replacement) = canonical.get(&frame.address()) {
            *frame = replacement.clone();
        }
    }

    for slot in stack.0.borrow_mut().frames.iter_mut() {
        let Some(frame) = slot else { continue };
        let mut data = frame.0.borrow_mut();
        let Some(parent) = data.parent.clone() else {
            continue;
        };
        match canonical.get(&parent.address()) {
            Some(replacement) => data.parent = Some(replacement.clone()),
            None => log::warn!(
                "fixup: a frame's parent has no containing stack frame to re-seat onto"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[derive(Debug)]
    struct NoopCallback;
    impl rt::NativeCallback for NoopCallback {}

    fn frame(parent: Option<rt::Frame>) -> rt::Frame {
        let env = rt::Table::new();
        let closure = rt::Closure::native(env, Rc::new(NoopCallback));
        rt::Frame(std::rc::Rc::new(std::cell::RefCell::new(rt::FrameData {
            idx: 0,
            closure,
            parent,
            pc: 0,
            base: 0,
            local_base: 0,
            return_base: 0,
            n_args: 0,
            n_ret: 0,
            tail_call: 0,
        })))
    }

    #[test]
    fn reseats_parent_and_current_frame_onto_the_array_element() {
        let standalone_child = frame(None);
        let standalone_parent = frame(None);
        standalone_child.0.borrow_mut().parent = Some(standalone_parent.clone());

        let canonical_parent = frame(None);
        let canonical_child = frame(Some(standalone_parent.clone()));

        let mut canonical = HashMap::new();
        canonical.insert(standalone_parent.address(), canonical_parent.clone());
        canonical.insert(standalone_child.address(), canonical_child.clone());

        let stack = rt::CallFrameStack::with_capacity(2);
        stack.0.borrow_mut().frames[0] = Some(canonical_parent.clone());
        stack.0.borrow_mut().frames[1] = Some(canonical_child.clone());

        let mut current_frame = Some(standalone_child.clone());
        reseat(&canonical, &mut current_frame, &stack);

        assert_eq!(current_frame, Some(canonical_child.clone()));
        assert_eq!(
            canonical_child.0.borrow().parent,
            Some(canonical_parent.clone())
        );
    }

    #[test]
    fn leaves_unowned_parent_as_is() {
        let foreign = frame(None);
        let child_data = frame(Some(foreign.clone()));
        let stack = rt::CallFrameStack::with_capacity(1);
        stack.0.borrow_mut().frames[0] = Some(child_data.clone());

        let canonical = HashMap::new();
        let mut current_frame = None;
        reseat(&canonical, &mut current_frame, &stack);

        assert_eq!(child_data.0.borrow().parent, Some(foreign));
    }
}
