#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![deny(unsafe_code)]
#![doc = include_str!("../README.md")]

extern crate alloc;

mod tracing_macros;

mod window;
pub use window::*;

mod error;
pub use error::*;

mod meta;
pub use meta::*;

mod jar;
pub use jar::*;

mod plan;
pub use plan::*;

mod key;
pub use key::*;

mod shape;
pub use shape::*;

mod blit;
pub use blit::*;

mod numeric;
pub use numeric::*;

#[cfg(test)]
mod tests {
    use super::*;
    use static_assertions::assert_impl_all;

    assert_impl_all!(Primitive<u32>: Jar, Send, Sync, Copy);
    assert_impl_all!(VarUInt: Jar, Send, Sync);
    assert_impl_all!(Plan<u64>: Send, Sync, Clone);
    assert_impl_all!(Compiled<u64>: Send, Sync);
    assert_impl_all!(BlitOps<[u16; 4]>: Send, Sync, Copy);
    assert_impl_all!(BoxedJar<bool>: Jar, Send, Sync);

    #[test]
    fn adapter_plans_decode_through_the_jar() {
        brine_testhelpers::setup();
        let jar: BoxedJar<u64> = alloc::sync::Arc::new(VarUInt);
        let plan = Plan::adapter(jar);
        assert!(!plan.is_specialized());
        let parsed = plan.run(Window::new(&[0xac, 0x02, 0xff])).unwrap();
        assert_eq!(parsed, Parsed::new(300, 2));
        assert!(plan.describe().contains("adapter"));
    }

    #[test]
    fn compiled_lowers_once() {
        brine_testhelpers::setup();
        let cache = Compiled::<bool>::new();
        assert!(!cache.is_lowered());
        let mut lowered = 0;
        for _ in 0..3 {
            cache.get_or_lower(|| {
                lowered += 1;
                Bool.plan().unwrap()
            });
        }
        assert_eq!(lowered, 1);
        assert!(cache.is_lowered());
    }
}
