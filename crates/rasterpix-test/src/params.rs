//! Regression test parameters and operations

use rasterpix_core::Image;

/// Regression test state
///
/// Tracks the test name, a running comparison index, and the overall
/// success status with recorded failures.
pub struct RegParams {
    /// Name of the test (e.g., "rotate")
    pub test_name: String,
    /// Current comparison index (incremented before each check)
    index: usize,
    /// Overall success status
    success: bool,
    /// Recorded failures
    failures: Vec<String>,
}

impl RegParams {
    /// Create new regression test parameters.
    pub fn new(test_name: &str) -> Self {
        eprintln!();
        eprintln!("////////////////////////////////////////////////");
        eprintln!("////////////////   {}_reg   ///////////////", test_name);
        eprintln!("////////////////////////////////////////////////");

        Self {
            test_name: test_name.to_string(),
            index: 0,
            success: true,
            failures: Vec::new(),
        }
    }

    /// Get the current comparison index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Compare two floating-point values.
    ///
    /// Returns `true` if they match within `delta`.
    pub fn compare_values(&mut self, expected: f64, actual: f64, delta: f64) -> bool {
        self.index += 1;
        let diff = (expected - actual).abs();

        if diff > delta {
            let msg = format!(
                "Failure in {}_reg: value comparison for index {}\n\
                 difference = {} but allowed delta = {}\n\
                 expected = {}, actual = {}",
                self.test_name, self.index, diff, delta, expected, actual
            );
            eprintln!("{}", msg);
            self.failures.push(msg);
            self.success = false;
            false
        } else {
            true
        }
    }

    /// Record a named boolean check.
    pub fn check(&mut self, what: &str, ok: bool) -> bool {
        self.index += 1;
        if !ok {
            let msg = format!(
                "Failure in {}_reg: {} (index {})",
                self.test_name, what, self.index
            );
            eprintln!("{}", msg);
            self.failures.push(msg);
            self.success = false;
        }
        ok
    }

    /// Compare two images for resolved-pixel equality.
    pub fn compare_images(&mut self, img1: &Image, img2: &Image) -> bool {
        self.index += 1;

        if img1.width() != img2.width()
            || img1.height() != img2.height()
            || img1.format() != img2.format()
        {
            let msg = format!(
                "Failure in {}_reg: image comparison for index {} - header mismatch \
                 ({}x{} {:?} vs {}x{} {:?})",
                self.test_name,
                self.index,
                img1.width(),
                img1.height(),
                img1.format(),
                img2.width(),
                img2.height(),
                img2.format()
            );
            eprintln!("{}", msg);
            self.failures.push(msg);
            self.success = false;
            return false;
        }

        for y in 0..img1.height() {
            for x in 0..img1.width() {
                if img1.pixel(x, y) != img2.pixel(x, y) {
                    let msg = format!(
                        "Failure in {}_reg: image comparison for index {} - pixel mismatch at ({}, {})",
                        self.test_name, self.index, x, y
                    );
                    eprintln!("{}", msg);
                    self.failures.push(msg);
                    self.success = false;
                    return false;
                }
            }
        }

        true
    }

    /// Compare two binary data arrays.
    pub fn compare_strings(&mut self, data1: &[u8], data2: &[u8]) -> bool {
        self.index += 1;

        if data1 != data2 {
            let msg = format!(
                "Failure in {}_reg: string comparison for index {}\n\
                 sizes: {} vs {}",
                self.test_name,
                self.index,
                data1.len(),
                data2.len()
            );
            eprintln!("{}", msg);
            self.failures.push(msg);
            self.success = false;
            false
        } else {
            true
        }
    }

    /// Clean up and report results.
    ///
    /// Returns `true` if every comparison passed.
    pub fn cleanup(self) -> bool {
        if self.success {
            eprintln!("SUCCESS: {}_reg", self.test_name);
        } else {
            eprintln!("FAILURE: {}_reg", self.test_name);
            for failure in &self.failures {
                eprintln!("  {}", failure);
            }
        }
        eprintln!();

        self.success
    }

    /// Check if all comparisons have passed so far.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Get the list of failures.
    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}
