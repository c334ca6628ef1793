//! Benchmarks for property lookup and editing
//!
//! Run with: cargo bench -p appxaml-core

use appxaml_core::{Document, LineAddressedBuffer, RopeBuffer};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// A typical application definition
const APP_XAML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Application x:Class="Contoso.App"
             xmlns="http://schemas.microsoft.com/winfx/2006/xaml/presentation"
             xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml"
             xmlns:local="clr-namespace:Contoso"
             ShutdownMode="OnMainWindowClose"
             StartupUri="Views/MainWindow.xaml">
    <Application.Resources>
        <ResourceDictionary>
            <!-- Brushes -->
            <SolidColorBrush x:Key="AccentBrush" Color="#FF0078D7"/>
            <SolidColorBrush x:Key="ForegroundBrush" Color="#FF202020"/>
        </ResourceDictionary>
    </Application.Resources>
</Application>
"#;

/// Builds a document whose property element sits after `count` resources.
fn large_document(count: usize) -> String {
    let mut text = String::from(
        "<Application x:Class=\"Contoso.App\"\n             xmlns:x=\"urn:x\">\n    <Application.Resources>\n        <ResourceDictionary>\n",
    );
    for i in 0..count {
        text.push_str(&format!(
            "            <Style x:Key=\"Style{i}\" TargetType=\"Button\"><Setter Property=\"Margin\" Value=\"{i}\"/></Style>\n"
        ));
    }
    text.push_str("        </ResourceDictionary>\n    </Application.Resources>\n");
    text.push_str("    <Application.StartupUri>Views/<![CDATA[Main]]>Window.xaml</Application.StartupUri>\n");
    text.push_str("</Application>\n");
    text
}

fn bench_typical(c: &mut Criterion) {
    let mut group = c.benchmark_group("typical");
    group.throughput(Throughput::Bytes(APP_XAML.len() as u64));

    group.bench_function("get_startup_uri", |b| {
        let mut buffer = RopeBuffer::from(APP_XAML);
        b.iter(|| {
            let doc = Document::new(&mut buffer);
            black_box(doc.startup_uri().unwrap())
        })
    });

    group.bench_function("set_startup_uri", |b| {
        b.iter(|| {
            let mut buffer = RopeBuffer::from(APP_XAML);
            Document::new(&mut buffer)
                .set_startup_uri(black_box("Views/Shell.xaml"))
                .unwrap();
            black_box(buffer.line_count())
        })
    });

    group.bench_function("verify_valid", |b| {
        let mut buffer = RopeBuffer::from(APP_XAML);
        b.iter(|| {
            let doc = Document::new(&mut buffer);
            doc.verify_valid().unwrap()
        })
    });

    group.finish();
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");

    for count in [10, 100, 1000].iter() {
        let content = large_document(*count);
        group.throughput(Throughput::Bytes(content.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("get_element", count),
            &content,
            |b, content| {
                let mut buffer = RopeBuffer::from(content.as_str());
                b.iter(|| {
                    let doc = Document::new(&mut buffer);
                    black_box(doc.startup_uri().unwrap())
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("set_element", count),
            &content,
            |b, content| {
                b.iter(|| {
                    let mut buffer = RopeBuffer::from(content.as_str());
                    Document::new(&mut buffer)
                        .set_startup_uri(black_box("Views/Shell.xaml"))
                        .unwrap();
                    black_box(buffer.line_count())
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_typical, bench_scaling);
criterion_main!(benches);
