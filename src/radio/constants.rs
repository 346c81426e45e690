/**
 * How long (milliseconds) stopping a scan may take.
 */
pub const STOP_SCAN_DEADLINE: u64 = 2000;

/**
 * How long (milliseconds) disconnecting from a peripheral may take when a connection is closed.
 */
pub const DISCONNECT_DEADLINE: u64 = 2000;

/**
 * How long (milliseconds) the scan round-trip used to probe for the bluetooth permission may take.
 */
pub const PERMISSION_PROBE_DEADLINE: u64 = 5000;

/**
 * Used as the address of peripherals for which the host hides the hardware address (macOS).
 */
pub const HIDDEN_ADDRESS_PREFIX: &str = "id:";
