use crate::device::StorageDevice;
use crate::value::Value;

/// Checks that a value has the expected shape and that every element is
/// within `tolerance` of the expected data.
/// Panics if shapes differ or data differs significantly.
pub fn check_value_near(
    actual: &Value,
    expected_shape: &[usize],
    expected_data: &[f64],
    tolerance: f64,
) {
    assert!(actual.is_defined(), "Expected a defined value, got an empty one");
    assert_eq!(actual.shape(), expected_shape, "Shape mismatch");

    let actual_data = actual
        .to_vec_f64()
        .expect("Failed to read data in check_value_near");
    assert_eq!(
        actual_data.len(),
        expected_data.len(),
        "Data length mismatch"
    );

    for (i, (a, e)) in actual_data.iter().zip(expected_data.iter()).enumerate() {
        if !approx::abs_diff_eq!(*a, *e, epsilon = tolerance) {
            panic!(
                "Data mismatch at index {}: actual={:?}, expected={:?}, tolerance={:?}",
                i, a, e, tolerance
            );
        }
    }
}

/// Runs `scenario` once per device tag, CPU first.
pub fn for_each_device<F: FnMut(StorageDevice)>(mut scenario: F) {
    for device in StorageDevice::ALL {
        scenario(device);
    }
}

/// Installs `env_logger` for unit tests; repeated calls are no-ops.
#[cfg(test)]
pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
