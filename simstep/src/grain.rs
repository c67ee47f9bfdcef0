use std::{borrow::Cow, fmt::Debug};

/// Granularity tag of a step point.
///
/// A grain identifies *which kind* of candidate suspension point the worker
/// is passing (per cycle, per trial, per epoch...). The stepper never orders
/// or interprets grains: a step point counts only when its grain is equal
/// (`==`) to the grain the controller asked to step by. Any notion of
/// coarser or finer granularity lives in the caller's choice of call sites.
///
/// Grains must be `Send + Sync + Clone + 'static` because they are stored in
/// the shared control state and published to watchers on other threads.
///
/// # Labels
///
/// `label()` returns a human-readable name used for logging only. The
/// default renders the `Debug` representation. With `#[derive(Grain)]` on an
/// enum, `label()` returns the variant name (e.g., "Cycle").
///
/// Integers, `char`, `bool`, `&'static str` and `String` are grains out of
/// the box, so small integer tags work without any declaration.
pub trait Grain: Clone + PartialEq + Debug + Send + Sync + 'static {
    fn label(&self) -> Cow<'static, str> {
        Cow::Owned(format!("{self:?}"))
    }
}

macro_rules! impl_grain_via_to_string {
    ($($t:ty),* $(,)?) => {
        $(
            impl Grain for $t {
                fn label(&self) -> Cow<'static, str> {
                    Cow::Owned(self.to_string())
                }
            }
        )*
    };
}

impl_grain_via_to_string!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, char, bool
);

impl Grain for &'static str {
    fn label(&self) -> Cow<'static, str> {
        Cow::Borrowed(*self)
    }
}

impl Grain for String {
    fn label(&self) -> Cow<'static, str> {
        Cow::Owned(self.clone())
    }
}
