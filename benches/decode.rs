use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn generate_ascii_ply(vertex_count: usize) -> Vec<u8> {
    let mut ply_data = format!(
        r#"ply
format ascii 1.0
element vertex {vertex_count}
property float x
property float y
property float z
property uchar red
property uchar green
property uchar blue
end_header
"#
    );

    for i in 0..vertex_count {
        let base = i as f32 * 0.01;
        ply_data.push_str(&format!(
            "{} {} {} {} {} {}\n",
            base,
            base + 1.0,
            base + 2.0,
            i % 256,
            (i * 3) % 256,
            (i * 7) % 256
        ));
    }
    ply_data.into_bytes()
}

fn generate_binary_mesh(grid: usize) -> Vec<u8> {
    let vertex_count = grid * grid;
    let face_count = (grid - 1) * (grid - 1);
    let header = format!(
        r#"ply
format binary_little_endian 1.0
element vertex {vertex_count}
property float x
property float y
property float z
property float nx
property float ny
property float nz
element face {face_count}
property list uchar int vertex_indices
end_header
"#
    );

    let mut binary_data = header.into_bytes();
    for row in 0..grid {
        for col in 0..grid {
            for v in [col as f32, row as f32, 0.0, 0.0, 0.0, 1.0] {
                binary_data.extend_from_slice(&v.to_le_bytes());
            }
        }
    }
    for row in 0..grid - 1 {
        for col in 0..grid - 1 {
            let i = (row * grid + col) as i32;
            let g = grid as i32;
            binary_data.push(4);
            for index in [i, i + 1, i + g + 1, i + g] {
                binary_data.extend_from_slice(&index.to_le_bytes());
            }
        }
    }
    binary_data
}

fn benchmark_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    let ascii_data = generate_ascii_ply(10_000);
    group.throughput(Throughput::Bytes(ascii_data.len() as u64));
    group.bench_function("ascii_colored_points", |b| {
        b.iter(|| ply_geometry::decode(black_box(&ascii_data)).unwrap());
    });

    let binary_data = generate_binary_mesh(200);
    group.throughput(Throughput::Bytes(binary_data.len() as u64));
    group.bench_function("binary_quad_mesh", |b| {
        b.iter(|| ply_geometry::decode(black_box(&binary_data)).unwrap());
    });

    group.finish();
}

criterion_group!(benches, benchmark_decode);
criterion_main!(benches);
