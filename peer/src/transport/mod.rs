cfg_if! {
    if #[cfg(feature = "transport_local")] {
        pub mod local;
    } else {}
}
