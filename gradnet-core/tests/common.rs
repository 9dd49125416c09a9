use gradnet_core::value::Value;

// Installs the test logger once per test binary.
#[allow(dead_code)]
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// Helper to build an F64 value for tests.
#[allow(dead_code)]
pub fn value_f64(data: Vec<f64>, shape: Vec<usize>) -> Value {
    Value::from_vec_f64(data, shape).expect("Test value creation failed")
}
