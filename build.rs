fn main() {
    // Compile-time configuration defaults (see `SystemConfig::default`).
    for var in [
        "MAILBOX_WIFI_SSID",
        "MAILBOX_WIFI_PASSWORD",
        "MAILBOX_BROKER_HOST",
        "MAILBOX_BROKER_PORT",
        "MAILBOX_BROKER_USER",
        "MAILBOX_BROKER_PASSWORD",
    ] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
