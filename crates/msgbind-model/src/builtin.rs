//! Framework types known to every binding.
//!
//! Bindings refer to Foundation, UIKit/AppKit, CoreGraphics and friends
//! without describing them. This module lists those types per platform.

use msgbind_targets::ApplePlatform;

use crate::descriptor::{
    DelegateDescriptor, ExternalDescriptor, ExternalKind, GenericParam, ParamDescriptor,
    StructDescriptor, StructField,
};
use crate::typeref::TypeRef;

use ApplePlatform::{Ios, MacOs, TvOs, WatchOs};

const ALL: &[ApplePlatform] = &[Ios, TvOs, WatchOs, MacOs];
const NO_WATCH: &[ApplePlatform] = &[Ios, TvOs, MacOs];
const NO_WATCH_TV: &[ApplePlatform] = &[Ios, MacOs];
const MOBILE: &[ApplePlatform] = &[Ios, TvOs, WatchOs];
const MOBILE_NO_WATCH: &[ApplePlatform] = &[Ios, TvOs];
const IOS: &[ApplePlatform] = &[Ios];
const MAC: &[ApplePlatform] = &[MacOs];

/// A builtin NSObject subclass.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinClass {
    pub namespace: &'static str,
    pub name: &'static str,
    pub base: Option<&'static str>,
    pub protocols: &'static [&'static str],
    pub platforms: &'static [ApplePlatform],
}

/// A builtin handle-backed type that is not an NSObject.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinHandle {
    pub namespace: &'static str,
    pub name: &'static str,
    pub platforms: &'static [ApplePlatform],
}

impl BuiltinHandle {
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

macro_rules! class {
    ($ns:literal, $name:literal, $base:expr, [$($p:literal),*], $plat:expr) => {
        BuiltinClass {
            namespace: $ns,
            name: $name,
            base: $base,
            protocols: &[$($p),*],
            platforms: $plat,
        }
    };
}

macro_rules! handle {
    ($ns:literal, $name:literal, $plat:expr) => {
        BuiltinHandle {
            namespace: $ns,
            name: $name,
            platforms: $plat,
        }
    };
}

pub const CLASSES: &[BuiltinClass] = &[
    class!("Foundation", "NSObject", None, [], ALL),
    class!("Foundation", "NSString", Some("Foundation.NSObject"), ["NSCoding", "NSCopying"], ALL),
    class!("Foundation", "NSMutableString", Some("Foundation.NSString"), [], ALL),
    class!("Foundation", "NSAttributedString", Some("Foundation.NSObject"), ["NSCoding"], ALL),
    class!("Foundation", "NSArray", Some("Foundation.NSObject"), ["NSCoding", "NSCopying"], ALL),
    class!("Foundation", "NSMutableArray", Some("Foundation.NSArray"), [], ALL),
    class!("Foundation", "NSDictionary", Some("Foundation.NSObject"), ["NSCoding", "NSCopying"], ALL),
    class!("Foundation", "NSMutableDictionary", Some("Foundation.NSDictionary"), [], ALL),
    class!("Foundation", "NSSet", Some("Foundation.NSObject"), ["NSCoding"], ALL),
    class!("Foundation", "NSValue", Some("Foundation.NSObject"), ["NSCoding"], ALL),
    class!("Foundation", "NSNumber", Some("Foundation.NSValue"), [], ALL),
    class!("Foundation", "NSData", Some("Foundation.NSObject"), ["NSCoding"], ALL),
    class!("Foundation", "NSDate", Some("Foundation.NSObject"), ["NSCoding"], ALL),
    class!("Foundation", "NSError", Some("Foundation.NSObject"), ["NSCoding"], ALL),
    class!("Foundation", "NSUrl", Some("Foundation.NSObject"), ["NSCoding"], ALL),
    class!("Foundation", "NSIndexPath", Some("Foundation.NSObject"), ["NSCoding"], ALL),
    class!("Foundation", "NSBundle", Some("Foundation.NSObject"), [], ALL),
    class!("Foundation", "NSCoder", Some("Foundation.NSObject"), [], ALL),
    class!("Foundation", "NSNotification", Some("Foundation.NSObject"), ["NSCoding"], ALL),
    class!("Foundation", "NSNotificationCenter", Some("Foundation.NSObject"), [], ALL),
    class!("Foundation", "NSRunLoop", Some("Foundation.NSObject"), [], ALL),
    class!("UIKit", "UIResponder", Some("Foundation.NSObject"), [], MOBILE_NO_WATCH),
    class!("UIKit", "UIView", Some("UIKit.UIResponder"), ["NSCoding", "UIAppearance"], MOBILE_NO_WATCH),
    class!("UIKit", "UIViewController", Some("UIKit.UIResponder"), ["NSCoding"], MOBILE_NO_WATCH),
    class!("UIKit", "UIColor", Some("Foundation.NSObject"), ["NSCoding"], MOBILE),
    class!("UIKit", "UIFont", Some("Foundation.NSObject"), ["NSCoding"], MOBILE),
    class!("UIKit", "UIImage", Some("Foundation.NSObject"), ["NSCoding"], MOBILE),
    class!("AppKit", "NSResponder", Some("Foundation.NSObject"), ["NSCoding"], MAC),
    class!("AppKit", "NSView", Some("AppKit.NSResponder"), [], MAC),
    class!("AppKit", "NSViewController", Some("AppKit.NSResponder"), [], MAC),
    class!("AppKit", "NSColor", Some("Foundation.NSObject"), ["NSCoding"], MAC),
    class!("AppKit", "NSFont", Some("Foundation.NSObject"), ["NSCoding"], MAC),
    class!("AppKit", "NSImage", Some("Foundation.NSObject"), ["NSCoding"], MAC),
    class!("CoreAnimation", "CALayer", Some("Foundation.NSObject"), ["NSCoding"], NO_WATCH),
];

/// Native protocols that may be listed without being described.
pub const PROTOCOLS: &[&str] = &[
    "NSCoding",
    "NSCopying",
    "NSMutableCopying",
    "NSSecureCoding",
    "NSObjectProtocol",
    "UIAppearance",
    "UIAppearanceContainer",
];

pub const NATIVE_HANDLES: &[BuiltinHandle] = &[
    handle!("ObjCRuntime", "Selector", ALL),
    handle!("ObjCRuntime", "Class", ALL),
    handle!("ObjCRuntime", "Protocol", NO_WATCH),
    handle!("AudioToolbox", "MusicSequence", MOBILE_NO_WATCH),
    handle!("CoreGraphics", "CGColor", ALL),
    handle!("CoreGraphics", "CGPath", ALL),
    handle!("CoreGraphics", "CGGradient", ALL),
    handle!("CoreGraphics", "CGContext", ALL),
    handle!("CoreGraphics", "CGImage", ALL),
    handle!("CoreFoundation", "CFRunLoop", ALL),
    handle!("CoreGraphics", "CGColorSpace", ALL),
    handle!("CoreFoundation", "DispatchQueue", ALL),
    handle!("CoreMidi", "MidiEndpoint", NO_WATCH_TV),
    handle!("CoreMedia", "CMTimebase", NO_WATCH),
    handle!("CoreMedia", "CMClock", NO_WATCH),
    handle!("Foundation", "NSZone", ALL),
    handle!("OpenGL", "CGLContext", MAC),
    handle!("OpenGL", "CGLPixelFormat", MAC),
    handle!("CoreVideo", "CVImageBuffer", NO_WATCH),
    handle!("MediaToolbox", "MTAudioProcessingTap", NO_WATCH),
    handle!("AddressBook", "ABAddressBook", IOS),
    handle!("AddressBook", "ABPerson", IOS),
    handle!("AddressBook", "ABRecord", IOS),
    handle!("CoreVideo", "CVPixelBuffer", NO_WATCH),
    handle!("CoreGraphics", "CGLayer", ALL),
    handle!("CoreMedia", "CMSampleBuffer", NO_WATCH),
    handle!("CoreVideo", "CVPixelBufferPool", NO_WATCH),
    handle!("AudioUnit", "AudioComponent", NO_WATCH),
    handle!("CoreMedia", "CMFormatDescription", NO_WATCH),
    handle!("CoreMedia", "CMAudioFormatDescription", NO_WATCH),
    handle!("CoreMedia", "CMVideoFormatDescription", NO_WATCH),
    handle!("AudioUnit", "AudioUnit", NO_WATCH),
    handle!("Security", "SecIdentity", ALL),
    handle!("Security", "SecTrust", ALL),
    handle!("Security", "SecAccessControl", ALL),
    handle!("AudioToolbox", "AudioBuffers", NO_WATCH),
    handle!("AudioUnit", "AURenderEventEnumerator", NO_WATCH),
];

/// Builtin classes available on `platform`.
pub fn classes(platform: ApplePlatform) -> impl Iterator<Item = &'static BuiltinClass> {
    CLASSES.iter().filter(move |c| c.platforms.contains(&platform))
}

/// Builtin handle types available on `platform`.
pub fn native_handles(platform: ApplePlatform) -> impl Iterator<Item = &'static BuiltinHandle> {
    NATIVE_HANDLES
        .iter()
        .filter(move |h| h.platforms.contains(&platform))
}

/// Builtin classes and other non-value types as external descriptors.
pub fn externals(platform: ApplePlatform) -> Vec<ExternalDescriptor> {
    let mut out: Vec<ExternalDescriptor> = classes(platform)
        .map(|c| ExternalDescriptor {
            name: c.name.to_string(),
            namespace: Some(c.namespace.to_string()),
            kind: ExternalKind::Object,
            base: c.base.map(str::to_string),
            protocols: c.protocols.iter().map(|p| p.to_string()).collect(),
        })
        .collect();

    out.extend(native_handles(platform).map(|h| ExternalDescriptor {
        name: h.name.to_string(),
        namespace: Some(h.namespace.to_string()),
        kind: ExternalKind::NativeObject,
        base: None,
        protocols: Vec::new(),
    }));

    for (ns, name) in [("System", "Object"), ("System", "Type"), ("System", "Uri")] {
        out.push(ExternalDescriptor {
            name: name.to_string(),
            namespace: Some(ns.to_string()),
            kind: ExternalKind::Opaque,
            base: None,
            protocols: Vec::new(),
        });
    }
    out
}

fn fields(pairs: &[(&str, &str)]) -> Vec<StructField> {
    pairs.iter()
        .map(|(name, ty)| StructField {
            name: name.to_string(),
            ty: TypeRef::named(*ty),
        })
        .collect()
}

fn value_type(ns: &str, name: &str, pairs: &[(&str, &str)]) -> StructDescriptor {
    StructDescriptor {
        name: name.to_string(),
        namespace: Some(ns.to_string()),
        fields: fields(pairs),
        size: None,
    }
}

/// Builtin value types available on `platform`.
pub fn structs(platform: ApplePlatform) -> Vec<StructDescriptor> {
    let mut out = vec![
        value_type("CoreGraphics", "CGPoint", &[("X", "nfloat"), ("Y", "nfloat")]),
        value_type("CoreGraphics", "CGSize", &[("Width", "nfloat"), ("Height", "nfloat")]),
        value_type(
            "CoreGraphics",
            "CGRect",
            &[("Origin", "CoreGraphics.CGPoint"), ("Size", "CoreGraphics.CGSize")],
        ),
        value_type("CoreGraphics", "CGVector", &[("dx", "nfloat"), ("dy", "nfloat")]),
        value_type(
            "CoreGraphics",
            "CGAffineTransform",
            &[
                ("xx", "nfloat"),
                ("yx", "nfloat"),
                ("xy", "nfloat"),
                ("yy", "nfloat"),
                ("x0", "nfloat"),
                ("y0", "nfloat"),
            ],
        ),
        value_type("Foundation", "NSRange", &[("Location", "nint"), ("Length", "nint")]),
        value_type(
            "CoreMedia",
            "CMTime",
            &[
                ("Value", "long"),
                ("TimeScale", "int"),
                ("TimeFlags", "uint"),
                ("TimeEpoch", "long"),
            ],
        ),
        value_type(
            "ObjCRuntime",
            "BlockLiteral",
            &[
                ("isa", "IntPtr"),
                ("flags", "int"),
                ("reserved", "int"),
                ("invoke", "IntPtr"),
                ("block_descriptor", "IntPtr"),
                ("local_handle", "IntPtr"),
                ("global_handle", "IntPtr"),
            ],
        ),
    ];
    if !platform.is_desktop() {
        out.push(value_type(
            "UIKit",
            "UIEdgeInsets",
            &[
                ("Top", "nfloat"),
                ("Left", "nfloat"),
                ("Bottom", "nfloat"),
                ("Right", "nfloat"),
            ],
        ));
    }
    out
}

fn generic(names: &[&str]) -> Vec<GenericParam> {
    names
        .iter()
        .map(|n| GenericParam {
            name: n.to_string(),
            constraint: None,
        })
        .collect()
}

fn action(params: &[&str]) -> DelegateDescriptor {
    DelegateDescriptor {
        name: "Action".to_string(),
        namespace: Some("System".to_string()),
        returns: TypeRef::void(),
        params: params
            .iter()
            .map(|p| ParamDescriptor::new(p.to_lowercase(), TypeRef::named(*p)))
            .collect(),
        generic_params: generic(params),
        default_value: None,
    }
}

/// Builtin delegate types.
pub fn delegates() -> Vec<DelegateDescriptor> {
    vec![
        action(&[]),
        action(&["T"]),
        action(&["T1", "T2"]),
        DelegateDescriptor {
            name: "Func".to_string(),
            namespace: Some("System".to_string()),
            returns: TypeRef::named("TResult"),
            params: Vec::new(),
            generic_params: generic(&["TResult"]),
            default_value: None,
        },
    ]
}
