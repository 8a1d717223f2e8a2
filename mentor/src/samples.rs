//! Built-in sample subjects for trying the review loop.

/// A named code snippet with a known class of defect.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub name: &'static str,
    pub description: &'static str,
    pub code: &'static str,
}

pub const SAMPLES: &[Sample] = &[
    Sample {
        name: "division-error",
        description: "division by zero at the call site",
        code: "def divide_numbers(a, b):\n    return a / b\n\nresult = divide_numbers(10, 0)\n",
    },
    Sample {
        name: "type-error",
        description: "mixed int/str comparison inside a max scan",
        code: "def get_max(numbers):\n    max_num = numbers[0]\n    for num in numbers:\n        if num > max_num:\n            max_num = num\n    return max_num\n\nprint(get_max([5, 2, 8, '10', 3]))\n",
    },
    Sample {
        name: "variable-error",
        description: "returns an undefined name",
        code: "def calculate_sum(a, b):\n    result = a + b\n    return res\n\nprint(calculate_sum(5, 10))\n",
    },
    Sample {
        name: "scope-error",
        description: "loop variable used after the loop",
        code: "def process_data():\n    data = [1, 2, 3]\n    for item in data:\n        result = item * 2\n    return result\n\nprint(process_data())\n",
    },
];

/// Look up a sample by name.
pub fn find(name: &str) -> Option<&'static Sample> {
    SAMPLES.iter().find(|s| s.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_known_sample() {
        let sample = find("scope-error").expect("sample");
        assert!(sample.code.contains("process_data"));
    }

    #[test]
    fn unknown_sample_is_none() {
        assert!(find("no-such-sample").is_none());
    }

    #[test]
    fn sample_names_are_unique() {
        let mut names: Vec<&str> = SAMPLES.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SAMPLES.len());
    }
}
