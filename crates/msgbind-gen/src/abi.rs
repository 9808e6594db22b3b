//! Struct-return and enum-width decisions.
//!
//! Whether a value-type return goes through the struct-return entry point
//! depends on the architecture, so the answer is computed separately for
//! the 32-bit device ABI and both simulator/desktop ABIs.

use msgbind_model::layout::value_size;
use msgbind_model::{Ty, TypeUniverse};
use msgbind_targets::{ApplePlatform, Arch};

use crate::callable::Callable;
use crate::error::Result;

/// Struct-return flags per ABI family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StretInfo {
    /// 32-bit device (armv7, or armv7k on watchOS).
    pub arm: bool,
    pub x86: bool,
    pub x64: bool,
}

impl StretInfo {
    pub fn any(&self) -> bool {
        self.arm || self.x86 || self.x64
    }
}

fn arch_needs_stret(universe: &TypeUniverse, ty: &Ty, arch: Arch) -> Result<bool> {
    // enums and scalars always come back in registers
    if !matches!(ty, Ty::Struct(_)) {
        return Ok(false);
    }
    let Some(size) = value_size(universe, ty, arch)? else {
        return Ok(false);
    };
    Ok(arch.aggregate_needs_stret(size.size_bytes))
}

/// Struct-return flags for returning `ty` on `platform`.
pub fn stret_info(universe: &TypeUniverse, ty: &Ty, platform: ApplePlatform) -> Result<StretInfo> {
    let arm = match platform.device_arm32() {
        Some(arch) => arch_needs_stret(universe, ty, arch)?,
        None => false,
    };
    Ok(StretInfo {
        arm,
        x86: arch_needs_stret(universe, ty, Arch::X86)?,
        x64: arch_needs_stret(universe, ty, Arch::X86_64)?,
    })
}

/// Whether any ABI the platform ships needs the struct-return entry point.
pub fn need_stret(universe: &TypeUniverse, ty: &Ty, platform: ApplePlatform) -> Result<bool> {
    let info = stret_info(universe, ty, platform)?;
    let mut stret = info.x86 || info.x64;
    if !platform.is_desktop() {
        stret |= info.arm;
    }
    Ok(stret)
}

/// Whether `ty` is an enum declared with native (pointer) width.
pub fn is_native_enum(universe: &TypeUniverse, ty: &Ty) -> bool {
    match ty {
        Ty::Enum(q) => universe.enum_descriptor(q).is_some_and(|e| e.native),
        _ => false,
    }
}

/// Native enums in the return or parameters need separate 32/64-bit paths.
pub fn has_native_enum_in_signature(universe: &TypeUniverse, callable: &Callable) -> bool {
    is_native_enum(universe, &callable.returns)
        || callable.params.iter().any(|p| is_native_enum(universe, &p.ty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use msgbind_model::{ApiDescription, Primitive, QualName};

    const STRUCTS: &str = r#"
[[structs]]
name = "Twenty"
namespace = "Demo"
size = 20

[[structs]]
name = "Twelve"
namespace = "Demo"
size = 12

[[structs]]
name = "Pair"
namespace = "Demo"
fields = [{ name = "a", type = "int" }, { name = "b", type = "int" }]

[[enums]]
name = "Mode"
namespace = "Demo"
underlying = "long"
native = true
values = [{ name = "A", value = 0 }]
"#;

    fn universe(platform: ApplePlatform) -> TypeUniverse {
        TypeUniverse::new(ApiDescription::parse(STRUCTS).unwrap(), platform).unwrap()
    }

    fn st(name: &str) -> Ty {
        Ty::Struct(QualName::parse(name))
    }

    #[test]
    fn twenty_bytes_is_stret_everywhere() {
        let u = universe(ApplePlatform::Ios);
        let info = stret_info(&u, &st("Demo.Twenty"), ApplePlatform::Ios).unwrap();
        assert!(info.x64);
        assert!(info.x86);
        assert!(info.arm);
    }

    #[test]
    fn twelve_bytes_disagrees_between_abis() {
        let u = universe(ApplePlatform::Ios);
        let info = stret_info(&u, &st("Demo.Twelve"), ApplePlatform::Ios).unwrap();
        assert!(!info.x64);
        assert!(info.x86);
        assert!(need_stret(&u, &st("Demo.Twelve"), ApplePlatform::Ios).unwrap());
    }

    #[test]
    fn small_struct_only_stret_on_arm() {
        let u = universe(ApplePlatform::Ios);
        let info = stret_info(&u, &st("Demo.Pair"), ApplePlatform::Ios).unwrap();
        assert_eq!(info, StretInfo { arm: true, x86: false, x64: false });

        let mac = universe(ApplePlatform::MacOs);
        assert!(!need_stret(&mac, &st("Demo.Pair"), ApplePlatform::MacOs).unwrap());

        let watch = universe(ApplePlatform::WatchOs);
        let info = stret_info(&watch, &st("Demo.Pair"), ApplePlatform::WatchOs).unwrap();
        assert!(!info.arm);
    }

    #[test]
    fn scalars_enums_and_objects_are_never_stret() {
        let u = universe(ApplePlatform::Ios);
        for ty in [
            Ty::Primitive(Primitive::Double),
            Ty::Enum(QualName::parse("Demo.Mode")),
            Ty::Class(QualName::parse("Foundation.NSString")),
            Ty::String,
        ] {
            assert!(!stret_info(&u, &ty, ApplePlatform::Ios).unwrap().any());
        }
    }

    #[test]
    fn native_enum_detection() {
        let u = universe(ApplePlatform::Ios);
        assert!(is_native_enum(&u, &Ty::Enum(QualName::parse("Demo.Mode"))));
        assert!(!is_native_enum(&u, &Ty::Primitive(Primitive::NInt)));
    }
}
