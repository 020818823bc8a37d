error_chain! {
    foreign_links {
        Io(::std::io::Error);
        Json(::json::Error);
        Fmt(::std::fmt::Error);
    }

    errors {
        /// The file is a kind of motion/model container we don't read, eg.
        /// a binary FBX.
        UnsupportedContainer(what: String) {
            description("unsupported container")
            display("unsupported container: {}", what)
        }
        /// The file parsed but doesn't describe a valid rig or clip.
        MalformedAsset(what: String) {
            description("malformed asset")
            display("malformed asset: {}", what)
        }
    }
}

/// Like `assert!`, but returns a `MalformedAsset` error instead of panicking.
macro_rules! check {
    ($b:expr, $($arg:tt)+) => {
        if !$b {
            Err($crate::errors::Error::from_kind(
                $crate::errors::ErrorKind::MalformedAsset(format!($($arg)+))
            ))
        } else {
            Ok(())
        }
    };
}
