use criterion::*;
use image::{ImageBuffer, Rgb, RgbImage};
use rag_segmentation::arrays::{Array2D, FeatureImage};
use rag_segmentation::clustering::hierarchical_clustering;
use rag_segmentation::common::ClusteringConfig;
use rag_segmentation::features::{aggregate_edges, aggregate_nodes};
use rag_segmentation::grid_graph::{GridGraph, Neighborhood};
use rag_segmentation::pipeline::segment;
use rag_segmentation::property_map::NodeMap;
use rag_segmentation::rag::make_region_adjacency_graph;
use std::time::Duration;

const SUPERPIXEL_SIZE: usize = 16;

fn synthetic_image(width: u32, height: u32) -> RgbImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        let r = ((x * 255) / width) as u8;
        let g = ((y * 255) / height) as u8;
        let b = if ((x / 97) + (y / 61)) % 2 == 0 { 40 } else { 220 };
        Rgb([r, g, b])
    })
}

/// Square superpixels with wavy borders, labels in row-major block order.
fn block_labels(width: usize, height: usize) -> Array2D<i64> {
    let blocks_x = width.div_ceil(SUPERPIXEL_SIZE);
    Array2D::from_fn(width, height, |x, y| {
        let shift = (((y as f32) * 0.3).sin() * 3.0) as isize;
        let xs = (x as isize + shift).clamp(0, width as isize - 1) as usize;
        (xs / SUPERPIXEL_SIZE + blocks_x * (y / SUPERPIXEL_SIZE)) as i64
    })
}

/// Sum of absolute forward differences of all channels.
fn edge_indicator(image: &FeatureImage) -> Array2D<f32> {
    Array2D::from_fn(image.width, image.height, |x, y| {
        let p = image.get_pixel(x, y);
        let right = image.get_pixel((x + 1).min(image.width - 1), y);
        let down = image.get_pixel(x, (y + 1).min(image.height - 1));
        p.iter()
            .zip(right)
            .zip(down)
            .map(|((c, r), d)| (c - r).abs() + (c - d).abs())
            .sum()
    })
}

struct Input {
    labels: Array2D<i64>,
    features: FeatureImage,
    edge_indicator: Array2D<f32>,
}

fn input(width: u32, height: u32) -> Input {
    let img = synthetic_image(width, height);
    let features =
        FeatureImage::from_u8(img.as_raw(), width as usize, height as usize, 3).unwrap();
    Input {
        labels: block_labels(width as usize, height as usize),
        edge_indicator: edge_indicator(&features),
        features,
    }
}

fn bench_rag(c: &mut Criterion) {
    sas::init();
    let input = input(1920, 1080);
    let mut group = c.benchmark_group("RAG build");
    for neighborhood in [Neighborhood::Four, Neighborhood::Eight] {
        let grid = GridGraph::new(input.labels.width, input.labels.height, neighborhood);
        let labels = NodeMap::from(&input.labels);
        group.bench_with_input(
            BenchmarkId::new("make_region_adjacency_graph", format!("{:?}", neighborhood)),
            &neighborhood,
            |b, _| {
                b.iter(|| {
                    let _ = black_box(make_region_adjacency_graph(&grid, &labels).unwrap());
                });
            },
        );
    }
}

fn bench_features(c: &mut Criterion) {
    sas::init();
    let input = input(1920, 1080);
    let grid = GridGraph::new(input.labels.width, input.labels.height, Neighborhood::Four);
    let rag = make_region_adjacency_graph(&grid, &NodeMap::from(&input.labels)).unwrap();
    let indicator = NodeMap::from(&input.edge_indicator);
    c.bench_function("aggregate_nodes", |b| {
        b.iter(|| {
            let _ = black_box(aggregate_nodes(&input.labels, &input.features).unwrap());
        });
    });
    c.bench_function("aggregate_edges", |b| {
        b.iter(|| {
            let _ = black_box(
                aggregate_edges(&rag.graph, &rag.affiliated_edges, &grid, &indicator).unwrap(),
            );
        });
    });
}

fn bench_clustering(c: &mut Criterion) {
    sas::init();
    let input = input(1920, 1080);
    let grid = GridGraph::new(input.labels.width, input.labels.height, Neighborhood::Four);
    let rag = make_region_adjacency_graph(&grid, &NodeMap::from(&input.labels)).unwrap();
    let (edge_weight, edge_length) = aggregate_edges(
        &rag.graph,
        &rag.affiliated_edges,
        &grid,
        &NodeMap::from(&input.edge_indicator),
    )
    .unwrap();
    let (node_mean, node_count) = aggregate_nodes(&input.labels, &input.features).unwrap();
    let mut group = c.benchmark_group("clustering");
    let settings = [(0.0, 0.0), (0.5, 0.0), (0.5, 1.0)];
    for (beta, wardness) in settings {
        let options = ClusteringConfig {
            min_region_count: 50,
            node_feature_importance: beta,
            size_importance: wardness,
            ..ClusteringConfig::default()
        }
        .validate()
        .unwrap();
        group.bench_with_input(
            BenchmarkId::new(
                "hierarchical_clustering",
                format!("beta={beta}-wardness={wardness}"),
            ),
            &options,
            |b, options| {
                b.iter(|| {
                    let _ = black_box(
                        hierarchical_clustering(
                            &rag.graph,
                            &edge_weight,
                            &edge_length,
                            &node_mean,
                            &node_count,
                            *options,
                        )
                        .unwrap(),
                    );
                });
            },
        );
    }
}

fn bench_segment(c: &mut Criterion) {
    sas::init();
    let sizes = [(960u32, 540u32), (1920, 1080), (3840, 2160)];
    let options = ClusteringConfig {
        min_region_count: 100,
        node_feature_importance: 0.5,
        size_importance: 0.3,
        ..ClusteringConfig::default()
    }
    .validate()
    .unwrap();
    let mut group = c.benchmark_group("segment");
    for (width, height) in sizes {
        let input = input(width, height);
        group.bench_with_input(
            BenchmarkId::new("segment", format!("{width}x{height}")),
            &input,
            |b, input| {
                b.iter(|| {
                    let _ = black_box(
                        segment(
                            &input.labels,
                            &input.features,
                            &input.edge_indicator,
                            Neighborhood::Four,
                            options,
                        )
                        .unwrap(),
                    );
                });
            },
        );
    }
}

criterion_group!(name = benches;
config = Criterion::default().measurement_time(Duration::from_secs(30)).warm_up_time(Duration::from_secs(10));
targets = bench_rag);
criterion_group!(name = benches1;
config = Criterion::default().measurement_time(Duration::from_secs(30)).warm_up_time(Duration::from_secs(10));
targets = bench_features);
criterion_group!(name = benches2;
config = Criterion::default().measurement_time(Duration::from_secs(30)).warm_up_time(Duration::from_secs(10));
targets = bench_clustering);
criterion_group!(name = benches3;
config = Criterion::default().measurement_time(Duration::from_secs(30)).warm_up_time(Duration::from_secs(10));
targets = bench_segment);
criterion_main!(benches, benches1, benches2, benches3);
