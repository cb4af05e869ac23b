use criterion::{criterion_group, criterion_main, Criterion};
use kiln_core::Recipe;
use kiln_schema::{parse_descriptor_str, DependencyRef, Settings};
use kiln_toolchain::mock::MockTool;

fn descriptor_with_deps(count: usize) -> (String, Vec<DependencyRef>) {
    let deps: Vec<DependencyRef> = (0..count)
        .map(|i| DependencyRef::new(&format!("dep{i:03}"), &format!("1.{i}.0"), None))
        .collect();
    let requires = deps
        .iter()
        .map(|d| format!("\"{d}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let toml = format!(
        "[package]\nname = \"bench\"\nrequires = [{requires}]\n[options]\nshared = false\n"
    );
    (toml, deps)
}

fn bench_package_id(c: &mut Criterion) {
    let (toml, deps) = descriptor_with_deps(32);
    let descriptor = parse_descriptor_str(&toml).unwrap().normalize().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let recipe = Recipe::from_descriptor(dir.path(), descriptor, &Settings::detect_host()).unwrap();

    c.bench_function("package_id_32_deps", |b| {
        b.iter(|| recipe.package_id(&deps).unwrap());
    });
}

fn bench_normalize(c: &mut Criterion) {
    let (toml, _) = descriptor_with_deps(32);
    c.bench_function("descriptor_parse_normalize_32_deps", |b| {
        b.iter(|| parse_descriptor_str(&toml).unwrap().normalize().unwrap());
    });
}

fn bench_translate(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let descriptor = parse_descriptor_str("[package]\nname = \"bench\"\n")
        .unwrap()
        .normalize()
        .unwrap();
    let recipe = Recipe::from_descriptor(dir.path(), descriptor, &Settings::detect_host())
        .unwrap()
        .with_tool(Box::new(MockTool::new()));

    c.bench_function("translate_invocation", |b| {
        b.iter(|| recipe.invocation().unwrap());
    });
}

criterion_group!(benches, bench_package_id, bench_normalize, bench_translate);
criterion_main!(benches);
