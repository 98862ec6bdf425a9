// Test Registry
// The built-in table of test programs plus filtering and label ordering.

use crate::domain::descriptor::TestDescriptor;
use crate::domain::error::Result;
use regex::Regex;
use std::path::Path;

/// Root of this workspace, where the array-kernel entries are built
pub const DEFAULT_KERNEL_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../..");

/// Ordered, validated collection of test descriptors
#[derive(Debug, Clone, Default)]
pub struct Registry {
    tests: Vec<TestDescriptor>,
}

impl Registry {
    /// Build a registry, validating every descriptor
    pub fn new(tests: Vec<TestDescriptor>) -> Result<Self> {
        for test in &tests {
            test.validate()?;
        }
        Ok(Self { tests })
    }

    /// The full built-in table, building the array kernel from this workspace
    pub fn builtin() -> Self {
        Self::builtin_with_kernel_dir(Path::new(DEFAULT_KERNEL_DIR))
    }

    /// The full built-in table, building the array kernel from the cargo
    /// workspace at `kernel_dir`. The kernel commands use absolute paths, so
    /// they run from any benchmark working directory.
    pub fn builtin_with_kernel_dir(kernel_dir: &Path) -> Self {
        Self {
            tests: builtin(kernel_dir),
        }
    }

    pub fn tests(&self) -> &[TestDescriptor] {
        &self.tests
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Append more descriptors (validated) after the existing ones
    pub fn extend(&mut self, extra: Vec<TestDescriptor>) -> Result<()> {
        for test in &extra {
            test.validate()?;
        }
        self.tests.extend(extra);
        Ok(())
    }

    /// Keep only the descriptors whose label matches
    pub fn filter(&self, pattern: &Regex) -> Self {
        Self {
            tests: self
                .tests
                .iter()
                .filter(|t| pattern.is_match(&t.label()))
                .cloned()
                .collect(),
        }
    }

    /// Distinct language/technique labels, sorted case-insensitively
    pub fn lang_techs(&self) -> Vec<String> {
        sorted_distinct(self.tests.iter().map(|t| t.lang_tech.as_str()))
    }

    /// Distinct compiler/option labels, sorted case-insensitively
    pub fn comp_opts(&self) -> Vec<String> {
        sorted_distinct(self.tests.iter().map(|t| t.comp_opt.as_str()))
    }
}

fn sorted_distinct<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut distinct: Vec<String> = Vec::new();
    for label in labels {
        if !distinct.iter().any(|l| l == label) {
            distinct.push(label.to_string());
        }
    }
    // Stable: labels equal ignoring case keep first-seen order
    distinct.sort_by_key(|l| l.to_lowercase());
    distinct
}

// ============================================================================
// Built-in table
// ============================================================================

/// Optimisation levels shared by the C, C++ and Fortran families:
/// (compiler label suffix, command-line flags)
const OPT_LEVELS: [(&str, &str); 6] = [
    ("", ""),
    (" -O", "-O"),
    (" -O1", "-O1"),
    (" -O2", "-O2"),
    (" -O3", "-O3"),
    (" -O3 native", "-O3 -march=native"),
];

fn join(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// One C/C++ program built as a subroutine object plus a main program
struct CxxFamily {
    lang_tech: &'static str,
    sub: &'static str,
    main: &'static str,
    define: &'static str,
}

impl CxxFamily {
    /// Entries for one compiler at every optimisation level
    fn entries(&self, cc: &str, label: &str, repeats: [u64; 6]) -> Vec<TestDescriptor> {
        OPT_LEVELS
            .iter()
            .zip(repeats)
            .map(|(&(suffix, flags), nrpt)| {
                let sub_src = format!("{}.cpp", self.sub);
                let sub_obj = format!("{}.o", self.sub);
                let main_src = format!("{}.cpp", self.main);
                TestDescriptor::new(
                    self.lang_tech,
                    format!("{}{}", label, suffix),
                    format!("./{}", self.main),
                    nrpt,
                )
                .with_build(join(&[cc, "-c", flags, self.define, sub_src.as_str(), "-o", sub_obj.as_str()]))
                .with_build(join(&[
                    cc,
                    "-o",
                    self.main,
                    flags,
                    self.define,
                    main_src.as_str(),
                    sub_obj.as_str(),
                ]))
                .with_cleanup(format!("rm -f {} {}", self.main, sub_obj))
            })
            .collect()
    }

    fn clang_and_gcc(&self, clang: [u64; 6], gcc: [u64; 6]) -> Vec<TestDescriptor> {
        let mut entries = self.entries("c++", "clang", clang);
        entries.extend(self.entries("g++", "g++", gcc));
        entries
    }
}

fn swift() -> Vec<TestDescriptor> {
    [
        ("Swiftc", "", 1_000),
        ("Swiftc -Onone", "-Onone", 1_000),
        ("Swiftc -O", "-O", 300_000),
        ("Swiftc -Ounchecked", "-Ounchecked", 500_000),
    ]
    .into_iter()
    .map(|(label, flag, nrpt)| {
        TestDescriptor::new("Swift", label, "./cstest", nrpt)
            .with_build(join(&["xcrun swiftc -o cstest", flag, "cstest.swift"]))
            .with_cleanup("rm -f cstest")
    })
    .collect()
}

fn assembler() -> TestDescriptor {
    TestDescriptor::new("Assembler", "clang", "./assmain", 5_000_000)
        .with_build("c++ -c -o subrasavx.o subrasavx.s")
        .with_build("c++ -o assmain -O cnrmain.cpp subrasavx.o")
        .with_cleanup("rm -f assmain subrasavx.o")
}

fn fortran() -> Vec<TestDescriptor> {
    let repeats = [100_000, 500_000, 500_000, 500_000, 500_000, 5_000_000];
    OPT_LEVELS
        .iter()
        .zip(repeats)
        .map(|(&(suffix, flags), nrpt)| {
            TestDescriptor::new("Fortran", format!("gfortran{}", suffix), "./cfmain", nrpt)
                .with_build(join(&["gfortran -c -o cfsub.o", flags, "cfsub.f"]))
                .with_build(join(&["gfortran -o cfmain", flags, "cfmain.f cfsub.o"]))
                .with_cleanup("rm -f cfmain cfsub.o")
        })
        .collect()
}

/// Interpreted entries: no build, no cleanup
fn scripts(entries: &[(&str, &str, &str, u64)]) -> Vec<TestDescriptor> {
    entries
        .iter()
        .map(|(lang, comp, run, nrpt)| TestDescriptor::new(*lang, *comp, *run, *nrpt))
        .collect()
}

fn rustc() -> Vec<TestDescriptor> {
    [
        ("Rustc", "", 1_000),
        ("Rustc -O", "-O", 100_000),
        ("Rustc -O3", "-C opt-level=3", 100_000),
        ("Rustc -O3 native", "-C target-cpu=native -C opt-level=3", 100_000),
    ]
    .into_iter()
    .map(|(label, flags, nrpt)| {
        TestDescriptor::new("Rust", label, "./crsmain", nrpt)
            .with_build(join(&["rustc", flags, "crsmain.rs"]))
            .with_cleanup("rm -f crsmain")
    })
    .collect()
}

/// The array-kernel binary, one entry per layout
fn workspace_kernel(kernel_dir: &Path) -> Vec<TestDescriptor> {
    let build = format!(
        "cargo build --release --quiet --manifest-path {} --target-dir {} --bin array-kernel",
        kernel_dir.join("Cargo.toml").display(),
        kernel_dir.join("target").display()
    );
    let binary = kernel_dir.join("target/release/array-kernel");

    [
        ("Rust : nested Vec", "nested", 100_000),
        ("Rust : iterators", "iterators", 100_000),
        ("Rust : unchecked", "unchecked", 100_000),
        ("Rust : flat", "flat", 100_000),
    ]
    .into_iter()
    .map(|(lang, layout, nrpt)| {
        TestDescriptor::new(
            lang,
            "cargo release",
            format!("{} --layout {}", binary.display(), layout),
            nrpt,
        )
        .with_build(build.clone())
    })
    .collect()
}

fn java() -> TestDescriptor {
    TestDescriptor::new("Java", "Java", "java csub", 500_000)
        .with_build("javac -g:none csub.java")
        .with_cleanup("rm -f csub.class")
}

fn builtin(kernel_dir: &Path) -> Vec<TestDescriptor> {
    let mut tests = swift();
    tests.push(assembler());
    tests.extend(fortran());
    tests.extend(scripts(&[
        ("R : raw", "Rscript", "Rscript csub.r", 5_000),
        ("R : ref class", "Rscript", "Rscript csubref.r", 3),
        ("R : outer", "Rscript", "Rscript csubouter.r", 20_000),
        ("Perl", "Perl", "perl csubraw.pl", 1_000),
        ("Perl/PDL : raw", "Perl/PDL", "perl csubpdl.pl", 10),
        ("Perl/PDL : vectors", "Perl/PDL", "perl csubpdlvec.pl", 30_000),
        ("Perl/PDL : arrays", "Perl/PDL", "perl csubpdlary.pl", 100_000),
        ("Python : lists", "Python2", "python csubraw.py", 1_000),
        ("Python : numpy raw", "Python2", "python csubnp.py", 200),
        ("Python : vectors", "Python2", "python csubnpv.py", 50_000),
        ("Python : arrays", "Python2", "python csubnpna.py", 50_000),
        ("Python : lists", "Python3", "python3 csubraw.py", 1_000),
        ("Python : numpy raw", "Python3", "python3 csubnp.py", 200),
        ("Python : vectors", "Python3", "python3 csubnpv.py", 50_000),
        ("Python : arrays", "Python3", "python3 csubnpna.py", 50_000),
    ]));
    tests.extend(rustc());
    tests.extend(workspace_kernel(kernel_dir));
    tests.push(java());
    tests.extend(scripts(&[
        ("Tcl : raw", "tclsh", "tclsh ctest.tcl", 200),
        ("Julia", "julia", "julia csub.jl", 500_000),
        ("Julia", "julia -O0", "julia -O0 csub.jl", 50_000),
        ("Julia", "julia -O1", "julia -O1 csub.jl", 200_000),
        ("Julia", "julia -O2", "julia -O2 csub.jl", 200_000),
        ("Julia", "julia -O3", "julia -O3 csub.jl", 200_000),
        ("Javascript", "Node.js", "node cjstest.js", 100_000),
        ("Javascript", "Node.js --no-opt", "node --no-opt cjstest.js", 6_000),
    ]));

    let fast = [100_000, 1_000_000, 1_000_000, 1_000_000, 1_000_000, 5_000_000];

    let raw = CxxFamily {
        lang_tech: "C : raw",
        sub: "csub",
        main: "cmain",
        define: "",
    };
    tests.extend(raw.clang_and_gcc(fast, fast));

    let vectors = CxxFamily {
        lang_tech: "C : vectors",
        sub: "cvsub",
        main: "cvmain",
        define: "",
    };
    tests.extend(vectors.clang_and_gcc(fast, fast));

    let boost = CxxFamily {
        lang_tech: "C++ : Boost",
        sub: "cbsub",
        main: "cbmain",
        define: "",
    };
    tests.extend(boost.clang_and_gcc(
        [5_000, 100_000, 5_000, 100_000, 100_000, 100_000],
        [5_000, 100_000, 3_000, 100_000, 100_000, 100_000],
    ));

    let boost_no_assert = CxxFamily {
        lang_tech: "C++ : Boost no assert",
        sub: "cbsub",
        main: "cbmain",
        define: "-DBOOST_DISABLE_ASSERTS",
    };
    tests.extend(boost_no_assert.clang_and_gcc(
        [5_000, 100_000, 3_000, 100_000, 100_000, 100_000],
        [5_000, 100_000, 100_000, 100_000, 100_000, 100_000],
    ));

    let num_rec = CxxFamily {
        lang_tech: "C : Num. rec.",
        sub: "cnrsub",
        main: "cnrmain",
        define: "",
    };
    tests.extend(num_rec.clang_and_gcc(
        fast,
        [100_000, 500_000, 500_000, 1_000_000, 1_000_000, 5_000_000],
    ));

    tests
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(registry: &'a Registry, lang: &str, comp: &str) -> &'a TestDescriptor {
        registry
            .tests()
            .iter()
            .find(|t| t.lang_tech == lang && t.comp_opt == comp)
            .unwrap_or_else(|| panic!("missing {} / {}", lang, comp))
    }

    #[test]
    fn test_builtin_entries_are_valid() {
        let registry = Registry::builtin();
        assert!(Registry::new(registry.tests().to_vec()).is_ok());
        // 4 swift + 1 asm + 6 fortran + 15 scripts + 4 rustc + 4 kernel + 1 java
        // + 8 scripts + 5 C/C++ families * 12
        assert_eq!(registry.len(), 4 + 1 + 6 + 15 + 4 + 4 + 1 + 8 + 60);
    }

    #[test]
    fn test_builtin_c_commands() {
        let registry = Registry::builtin();

        let plain = find(&registry, "C : raw", "clang");
        assert_eq!(plain.build, vec!["c++ -c csub.cpp -o csub.o", "c++ -o cmain cmain.cpp csub.o"]);
        assert_eq!(plain.repeats, 100_000);

        let native = find(&registry, "C : Num. rec.", "g++ -O3 native");
        assert_eq!(
            native.build,
            vec![
                "g++ -c -O3 -march=native cnrsub.cpp -o cnrsub.o",
                "g++ -o cnrmain -O3 -march=native cnrmain.cpp cnrsub.o"
            ]
        );
        assert_eq!(native.cleanup.as_deref(), Some("rm -f cnrmain cnrsub.o"));
        assert_eq!(native.repeats, 5_000_000);

        let no_assert = find(&registry, "C++ : Boost no assert", "clang -O");
        assert_eq!(
            no_assert.build[0],
            "c++ -c -O -DBOOST_DISABLE_ASSERTS cbsub.cpp -o cbsub.o"
        );
        assert_eq!(find(&registry, "C++ : Boost", "g++ -O1").repeats, 3_000);
    }

    #[test]
    fn test_builtin_other_commands() {
        let registry = Registry::builtin();

        let fortran = find(&registry, "Fortran", "gfortran -O2");
        assert_eq!(fortran.build[0], "gfortran -c -o cfsub.o -O2 cfsub.f");
        assert_eq!(fortran.build[1], "gfortran -o cfmain -O2 cfmain.f cfsub.o");

        let swift = find(&registry, "Swift", "Swiftc");
        assert_eq!(swift.build, vec!["xcrun swiftc -o cstest cstest.swift"]);

        let rust = find(&registry, "Rust", "Rustc -O3 native");
        assert_eq!(
            rust.build,
            vec!["rustc -C target-cpu=native -C opt-level=3 crsmain.rs"]
        );

        let r_ref = find(&registry, "R : ref class", "Rscript");
        assert!(r_ref.build.is_empty());
        assert!(r_ref.cleanup.is_none());
        assert_eq!(r_ref.repeats, 3);
    }

    #[test]
    fn test_kernel_entries_independent_of_workdir() {
        let registry = Registry::builtin_with_kernel_dir(Path::new("/opt/arraybench"));

        let flat = find(&registry, "Rust : flat", "cargo release");
        assert_eq!(
            flat.build,
            vec![
                "cargo build --release --quiet --manifest-path /opt/arraybench/Cargo.toml \
                 --target-dir /opt/arraybench/target --bin array-kernel"
            ]
        );
        assert_eq!(
            flat.run,
            "/opt/arraybench/target/release/array-kernel --layout flat"
        );
        assert!(flat.cleanup.is_none());

        let builtin = Registry::builtin();
        let default = find(&builtin, "Rust : nested Vec", "cargo release");
        assert!(Path::new(DEFAULT_KERNEL_DIR).is_absolute());
        assert!(default.run.starts_with(DEFAULT_KERNEL_DIR));
    }

    #[test]
    fn test_labels_sorted_case_insensitively() {
        let registry = Registry::new(vec![
            TestDescriptor::new("Python : lists", "python3", "python3 a.py", 10),
            TestDescriptor::new("C : raw", "g++", "./a", 10),
            TestDescriptor::new("assembler", "Python2", "./b", 10),
            TestDescriptor::new("C : raw", "clang", "./a", 10),
        ])
        .unwrap();

        assert_eq!(registry.lang_techs(), vec!["assembler", "C : raw", "Python : lists"]);
        assert_eq!(registry.comp_opts(), vec!["clang", "g++", "Python2", "python3"]);
    }

    #[test]
    fn test_filter_by_label() {
        let registry = Registry::builtin();
        let pattern = Regex::new("^Fortran / ").unwrap();
        let fortran = registry.filter(&pattern);
        assert_eq!(fortran.len(), 6);
        assert_eq!(fortran.lang_techs(), vec!["Fortran"]);
    }

    #[test]
    fn test_new_rejects_invalid_entry() {
        let result = Registry::new(vec![TestDescriptor::new("A,B", "cc", "./a", 10)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_registry() {
        let registry = Registry::new(Vec::new()).unwrap();
        assert!(registry.is_empty());
        assert!(registry.lang_techs().is_empty());
    }
}
